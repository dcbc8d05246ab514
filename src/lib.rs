//! Proxy Checker
//!
//! Validates harvested proxy lists by connecting through every candidate over
//! HTTP, SOCKS4 and SOCKS5, and reports the working ones ranked by speed.

pub mod error;
pub mod logging;
pub mod proxy;
pub mod report;

pub use error::{AddressParseError, ProbeError, ScanError};
pub use proxy::*;
pub use report::{ReportConfig, ScanReport};

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Probing behaviour
    pub checker: CheckerConfig,
    /// Source loading behaviour
    pub crawler: CrawlerConfig,
    /// Output files and reports
    pub report: ReportConfig,
}

/// Outcome of [`run_scan`]
#[derive(Debug)]
pub struct ScanOutput {
    pub results: ResultSet,
    pub report: ScanReport,
}

/// Scan a list of candidates, write the result files and return the summary
///
/// Returns [`ScanError::NoProxiesLoaded`] without touching the output
/// directory when no candidate is a valid proxy address.
pub async fn run_scan(
    checker: &ProxyChecker,
    candidates: &[String],
    report: &ReportConfig,
) -> Result<ScanOutput> {
    let started_at = chrono::Utc::now();
    let addresses = ProxyParser::parse_addresses(candidates);
    let checked = addresses.len();

    let results = checker.scan_addresses(addresses).await?;
    let results = ResultSet::aggregate(results);

    let scan_report = ScanReport::new(
        started_at,
        candidates.len(),
        checked,
        &results,
        checker.tally().snapshot(),
    );
    report::save(&results, &scan_report, report)?;

    Ok(ScanOutput {
        results,
        report: scan_report,
    })
}
