use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use proxy_checker::{
    logging, run_scan, CheckerConfig, Config, CrawlerConfig, Protocol, ProxyChecker,
    ProxyCrawler, ProxyParser, ReportConfig,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

const TITLE: &str = r#"
  ____                         ____ _               _
 |  _ \ _ __ _____  ___   _   / ___| |__   ___  ___| | _____ _ __
 | |_) | '__/ _ \ \/ / | | | | |   | '_ \ / _ \/ __| |/ / _ \ '__|
 |  __/| | | (_) >  <| |_| | | |___| | | |  __/ (__|   <  __/ |
 |_|   |_|  \___/_/\_\__, |  \____|_| |_|\___|\___|_|\_\___|_|
                      |___/
"#;

/// Check harvested proxy lists over HTTP, SOCKS4 and SOCKS5
#[derive(Parser)]
#[command(name = "proxy-checker")]
#[command(about = "Check harvested proxy lists over HTTP, SOCKS4 and SOCKS5")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show every probe failure
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxies and save the working ones
    Check(CheckArgs),
    /// Extract unique ip:port candidates from sources without checking them
    Extract {
        /// Comma-separated URLs or file paths
        sources: String,
        /// Output file for extracted candidates
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Timeout in seconds for fetching URL sources
        #[arg(long, default_value = "30")]
        source_timeout: u64,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Comma-separated URLs or file paths (prompted for when omitted)
    sources: Option<String>,
    /// Number of proxies checked at once
    #[arg(short = 'n', long, default_value = "100")]
    concurrency: usize,
    /// Timeout in seconds for each attempt
    #[arg(long, default_value = "5")]
    timeout: f64,
    /// Attempts per protocol
    #[arg(long, default_value = "3")]
    retries: usize,
    /// Pause in seconds between retries
    #[arg(long, default_value = "1")]
    retry_delay: f64,
    /// URL fetched through HTTP proxies
    #[arg(long, default_value = "http://httpbin.org/ip")]
    test_url: String,
    /// host:port SOCKS proxies are asked to connect to
    #[arg(long, default_value = "httpbin.org:80")]
    socks_target: String,
    /// Accept SOCKS proxies as soon as CONNECT succeeds
    #[arg(long)]
    no_socks_verify: bool,
    /// Protocols to try (http, socks4, socks5); defaults to all
    #[arg(short, long = "protocol")]
    protocols: Vec<Protocol>,
    /// Directory for result files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    /// Write bare ip:port lines without the measured speed
    #[arg(long)]
    no_latency: bool,
    /// Also write a JSON scan report to this path
    #[arg(long)]
    json: Option<PathBuf>,
    /// Timeout in seconds for fetching URL sources
    #[arg(long, default_value = "30")]
    source_timeout: u64,
}

impl CheckArgs {
    fn into_config(self) -> Result<(Config, Option<String>)> {
        let (socks_host, socks_port) = parse_socks_target(&self.socks_target)?;

        let checker = CheckerConfig::new()
            .with_concurrency(self.concurrency)
            .with_timeout(seconds(self.timeout, "--timeout")?)
            .with_max_retries(self.retries)
            .with_retry_backoff(seconds(self.retry_delay, "--retry-delay")?)
            .with_test_url(self.test_url)
            .with_socks_target(socks_host, socks_port)
            .with_socks_verification(!self.no_socks_verify)
            .with_protocols(self.protocols);

        let crawler =
            CrawlerConfig::new().with_timeout(Duration::from_secs(self.source_timeout));

        let mut report = ReportConfig::new()
            .with_output_dir(self.output_dir)
            .with_latency_annotation(!self.no_latency);
        if let Some(json) = self.json {
            report = report.with_json_path(json);
        }

        let config = Config {
            checker,
            crawler,
            report,
        };
        Ok((config, self.sources))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match cli.command {
        None => {
            print_title();
            check(Config::default(), None).await
        }
        Some(Commands::Check(args)) => {
            print_title();
            let (config, sources) = args.into_config()?;
            check(config, sources).await
        }
        Some(Commands::Extract {
            sources,
            output,
            source_timeout,
        }) => {
            let config = CrawlerConfig::new().with_timeout(Duration::from_secs(source_timeout));
            let crawler = ProxyCrawler::with_config(config)?;
            let candidates = crawler
                .load_candidates(&ProxyCrawler::split_sources(&sources))
                .await;
            let candidates: Vec<String> = candidates
                .into_iter()
                .filter(|c| ProxyParser::is_valid(c))
                .collect();

            info!("Total unique candidates: {}", candidates.len());

            match output {
                Some(path) => {
                    let mut content = candidates.join("\n");
                    content.push('\n');
                    std::fs::write(&path, content)?;
                    info!("Saved candidates to {}", path.display());
                }
                None => {
                    for candidate in &candidates {
                        println!("{}", candidate);
                    }
                }
            }
            Ok(())
        }
    }
}

async fn check(config: Config, sources: Option<String>) -> Result<()> {
    let sources = match sources {
        Some(sources) => sources,
        None => prompt_sources()?,
    };
    let sources = ProxyCrawler::split_sources(&sources);
    if sources.is_empty() {
        return Err(anyhow!("No proxy sources given"));
    }

    let crawler = ProxyCrawler::with_config(config.crawler)?;
    let candidates = crawler.load_candidates(&sources).await;

    let checker = ProxyChecker::with_config(config.checker);
    let output = run_scan(&checker, &candidates, &config.report).await?;
    output.report.print();

    Ok(())
}

fn print_title() {
    println!("{}", TITLE.magenta());
}

fn prompt_sources() -> Result<String> {
    print!(
        "{}",
        "Enter proxy sources (comma-separated URLs or file paths): ".cyan()
    );
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read proxy sources")?;
    Ok(line)
}

fn parse_socks_target(target: &str) -> Result<(String, u16)> {
    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Invalid SOCKS target: {}. Use host:port", target))?;
    let port: u16 = port
        .parse()
        .map_err(|_| anyhow!("Invalid SOCKS target port: {}", port))?;
    if host.is_empty() {
        return Err(anyhow!("Invalid SOCKS target: {}. Use host:port", target));
    }
    Ok((host.to_string(), port))
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| anyhow!("Invalid value for {}: {}", flag, value))
}
