//! Result files and the end-of-scan summary

use crate::proxy::{Address, FailureKind, Protocol, ResultSet};
use crate::Result;
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the file holding every working proxy regardless of protocol
pub const COMBINED_FILE_NAME: &str = "all_working_proxies.txt";

/// Where and how scan results are written
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Directory receiving the result files
    pub output_dir: PathBuf,
    /// Append `- Speed: 0.30s` to each line of the per-protocol files
    pub annotate_latency: bool,
    /// Optional JSON report path
    pub json_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            annotate_latency: true,
            json_path: None,
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_latency_annotation(mut self, annotate: bool) -> Self {
        self.annotate_latency = annotate;
        self
    }

    pub fn with_json_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.json_path = Some(path.into());
        self
    }
}

/// File name for one protocol's working proxies
pub fn protocol_file_name(protocol: Protocol) -> String {
    format!("{}_working_proxies.txt", protocol)
}

/// Write one file per non-empty protocol partition plus the combined file
///
/// Nothing is written when the result set is empty. Returns the written paths.
pub fn write_results(results: &ResultSet, config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if results.is_empty() {
        return Ok(written);
    }

    fs::create_dir_all(&config.output_dir)?;

    for (protocol, partition) in results.partitions() {
        let lines: Vec<String> = partition
            .iter()
            .map(|r| {
                if config.annotate_latency {
                    r.to_string()
                } else {
                    r.address.to_string()
                }
            })
            .collect();

        let path = config.output_dir.join(protocol_file_name(protocol));
        write_lines(&path, &lines)?;
        written.push(path);
    }

    let combined: Vec<String> = results.combined().iter().map(Address::to_string).collect();
    let path = config.output_dir.join(COMBINED_FILE_NAME);
    write_lines(&path, &combined)?;
    written.push(path);

    Ok(written)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

/// One working proxy in the JSON report
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub address: Address,
    pub latency_ms: u64,
}

/// Failed attempts for one `(protocol, kind)` pair
#[derive(Debug, Clone, Serialize)]
pub struct FailureCount {
    pub protocol: Protocol,
    pub kind: FailureKind,
    pub count: u64,
}

/// Summary of a finished scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Candidates handed to the scanner before validation
    pub candidates: usize,
    /// Candidates that passed validation and were probed
    pub checked: usize,
    pub elapsed_secs: f64,
    pub working: BTreeMap<Protocol, Vec<ReportEntry>>,
    pub failures: Vec<FailureCount>,
}

impl ScanReport {
    pub fn new(
        started_at: DateTime<Utc>,
        candidates: usize,
        checked: usize,
        results: &ResultSet,
        failures: BTreeMap<(Protocol, FailureKind), u64>,
    ) -> Self {
        let finished_at = Utc::now();
        let elapsed_secs = (finished_at - started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        let working = results
            .partitions()
            .map(|(protocol, partition)| {
                let entries = partition
                    .iter()
                    .map(|r| ReportEntry {
                        address: r.address,
                        latency_ms: r.latency_ms(),
                    })
                    .collect();
                (protocol, entries)
            })
            .collect();

        let failures = failures
            .into_iter()
            .map(|((protocol, kind), count)| FailureCount {
                protocol,
                kind,
                count,
            })
            .collect();

        Self {
            started_at,
            finished_at,
            candidates,
            checked,
            elapsed_secs,
            working,
            failures,
        }
    }

    /// Save the report as pretty-printed JSON
    ///
    /// Written to `<path>.tmp` first and renamed into place.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);

        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Error summary lines grouped by protocol, e.g. `  Timeout: 3`
    pub fn error_summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = None;
        for failure in &self.failures {
            if current != Some(failure.protocol) {
                lines.push(format!("{}:", failure.protocol.label()));
                current = Some(failure.protocol);
            }
            lines.push(format!("  {}: {}", failure.kind, failure.count));
        }
        lines
    }

    /// Print totals, timing and the error summary to stdout
    pub fn print(&self) {
        for (protocol, entries) in &self.working {
            println!(
                "{}",
                format!(
                    "\nTotal working {} proxies found: {}",
                    protocol.label(),
                    entries.len()
                )
                .cyan()
            );
        }

        println!(
            "{}",
            format!("\nTotal proxies checked: {}", self.checked).cyan()
        );
        println!(
            "{}",
            format!("Total time taken: {:.2} seconds", self.elapsed_secs).cyan()
        );

        println!("{}", "\nError summary:".yellow());
        let lines = self.error_summary();
        if lines.is_empty() {
            println!("  none");
        }
        for line in lines {
            println!("{}", line);
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write files and the optional JSON report, logging where everything went
pub fn save(results: &ResultSet, report: &ScanReport, config: &ReportConfig) -> Result<()> {
    for path in write_results(results, config)? {
        info!("Saved {}", path.display());
    }

    if let Some(json_path) = &config.json_path {
        report.write_json(json_path)?;
        info!("Saved scan report to {}", json_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyResult;
    use std::time::Duration;

    fn sample() -> ResultSet {
        ResultSet::aggregate(vec![
            ProxyResult::new(
                "1.2.3.4:8080".parse().unwrap(),
                Protocol::Http,
                Duration::from_millis(1000),
            ),
            ProxyResult::new(
                "5.6.7.8:3128".parse().unwrap(),
                Protocol::Http,
                Duration::from_millis(300),
            ),
            ProxyResult::new(
                "9.9.9.9:1080".parse().unwrap(),
                Protocol::Socks5,
                Duration::from_millis(150),
            ),
        ])
    }

    #[test]
    fn test_protocol_file_name() {
        assert_eq!(protocol_file_name(Protocol::Http), "http_working_proxies.txt");
        assert_eq!(
            protocol_file_name(Protocol::Socks4),
            "socks4_working_proxies.txt"
        );
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::new().with_output_dir(dir.path());

        let written = write_results(&sample(), &config).unwrap();
        assert_eq!(written.len(), 3);

        let http = fs::read_to_string(dir.path().join("http_working_proxies.txt")).unwrap();
        assert_eq!(
            http,
            "5.6.7.8:3128 - Speed: 0.30s\n1.2.3.4:8080 - Speed: 1.00s\n"
        );
        let socks5 = fs::read_to_string(dir.path().join("socks5_working_proxies.txt")).unwrap();
        assert_eq!(socks5, "9.9.9.9:1080 - Speed: 0.15s\n");
        assert!(!dir.path().join("socks4_working_proxies.txt").exists());

        let combined = fs::read_to_string(dir.path().join(COMBINED_FILE_NAME)).unwrap();
        assert_eq!(combined, "1.2.3.4:8080\n5.6.7.8:3128\n9.9.9.9:1080\n");
    }

    #[test]
    fn test_write_results_without_latency() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::new()
            .with_output_dir(dir.path())
            .with_latency_annotation(false);

        write_results(&sample(), &config).unwrap();
        let http = fs::read_to_string(dir.path().join("http_working_proxies.txt")).unwrap();
        assert_eq!(http, "5.6.7.8:3128\n1.2.3.4:8080\n");
    }

    #[test]
    fn test_empty_results_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig::new().with_output_dir(dir.path().join("out"));

        let written = write_results(&ResultSet::default(), &config).unwrap();
        assert!(written.is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_scan_report_json_and_error_summary() {
        let mut failures = BTreeMap::new();
        failures.insert((Protocol::Http, FailureKind::Timeout), 4);
        failures.insert((Protocol::Http, FailureKind::ConnectionRefused), 2);
        failures.insert((Protocol::Socks4, FailureKind::Other), 1);

        let report = ScanReport::new(Utc::now(), 5, 4, &sample(), failures);
        assert_eq!(
            report.error_summary(),
            vec![
                "HTTP:",
                "  Timeout: 4",
                "  ConnectionRefused: 2",
                "SOCKS4:",
                "  Other: 1",
            ]
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["candidates"], 5);
        assert_eq!(value["checked"], 4);
        assert_eq!(value["working"]["http"][0]["address"], "5.6.7.8:3128");
        assert_eq!(value["working"]["http"][0]["latency_ms"], 300);
        assert_eq!(value["failures"][0]["kind"], "Timeout");
        assert!(!dir.path().join("report.json.tmp").exists());
    }

    #[test]
    fn test_write_json_replaces_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, "stale").unwrap();

        let report = ScanReport::new(Utc::now(), 1, 1, &sample(), BTreeMap::new());
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["checked"], 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
