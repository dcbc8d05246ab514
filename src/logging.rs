//! Console logging with `[+]` / `[!]` / `[-]` markers

use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Prints each event as a colored level marker followed by its fields
pub struct ProxyFormatter;

impl<S, N> FormatEvent<S, N> for ProxyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) =
            match *event.metadata().level() {
                Level::TRACE => ("[ ]", |s| s.dimmed()),
                Level::DEBUG => ("[?]", |s| s.blue()),
                Level::INFO => ("[+]", |s| s.green().bold()),
                Level::WARN => ("[!]", |s| s.yellow().bold()),
                Level::ERROR => ("[-]", |s| s.red().bold()),
            };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Pick the default filter directive from the CLI verbosity flags
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "proxy_checker=debug",
        (false, true) => "proxy_checker=warn",
        (false, false) => "proxy_checker=info",
    }
}

/// Resolve the filter directive: `-v`/`-q` win, then `RUST_LOG`, then info
pub fn filter_directive(verbose: bool, quiet: bool, env: Option<&str>) -> String {
    match env {
        Some(env) if !verbose && !quiet && !env.trim().is_empty() => env.to_string(),
        _ => default_directive(verbose, quiet).to_string(),
    }
}

/// Install the global subscriber
pub fn init(verbose: bool, quiet: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directive(verbose, quiet, env.as_deref()))
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(ProxyFormatter)
        .try_init();
}
