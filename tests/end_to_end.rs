use async_trait::async_trait;
use proxy_checker::{
    run_scan, Address, CheckerConfig, ErrorTally, FailureKind, ProbeOutcome, Prober, Protocol,
    ProxyChecker, ProxyParser, ReportConfig, ScanError,
};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

/// Every known address works over HTTP at a fixed latency; everything else times out
struct StubProber {
    latencies: HashMap<String, Duration>,
}

#[async_trait]
impl Prober for StubProber {
    async fn probe(&self, address: &Address, protocol: Protocol, _: Duration) -> ProbeOutcome {
        match (protocol, self.latencies.get(&address.to_string())) {
            (Protocol::Http, Some(latency)) => ProbeOutcome::success(*latency),
            _ => ProbeOutcome::failure(FailureKind::Timeout),
        }
    }
}

fn checker(latencies: &[(&str, f64)]) -> ProxyChecker {
    let prober = StubProber {
        latencies: latencies
            .iter()
            .map(|(a, s)| (a.to_string(), Duration::from_secs_f64(*s)))
            .collect(),
    };
    let config = CheckerConfig::new().with_retry_backoff(Duration::ZERO);
    ProxyChecker::with_prober(config, Arc::new(prober), Arc::new(ErrorTally::new()))
}

#[tokio::test]
async fn scan_writes_ranked_and_combined_files() {
    let candidates = ProxyParser::extract_unique("1.2.3.4:8080 garbage 5.6.7.8:3128");
    assert_eq!(candidates, vec!["1.2.3.4:8080", "5.6.7.8:3128"]);

    let dir = tempfile::tempdir().unwrap();
    let report = ReportConfig::new()
        .with_output_dir(dir.path())
        .with_json_path(dir.path().join("report.json"));
    let checker = checker(&[("1.2.3.4:8080", 1.0), ("5.6.7.8:3128", 0.3)]);

    let output = run_scan(&checker, &candidates, &report).await.unwrap();
    assert_eq!(output.report.checked, 2);
    assert_eq!(output.results.partition(Protocol::Http).len(), 2);

    let http = fs::read_to_string(dir.path().join("http_working_proxies.txt")).unwrap();
    let lines: Vec<&str> = http.lines().collect();
    assert_eq!(
        lines,
        vec!["5.6.7.8:3128 - Speed: 0.30s", "1.2.3.4:8080 - Speed: 1.00s"]
    );

    let combined = fs::read_to_string(dir.path().join("all_working_proxies.txt")).unwrap();
    assert_eq!(combined, "1.2.3.4:8080\n5.6.7.8:3128\n");

    assert!(!dir.path().join("socks4_working_proxies.txt").exists());
    assert!(!dir.path().join("socks5_working_proxies.txt").exists());
    assert!(dir.path().join("report.json").exists());
}

#[tokio::test]
async fn failed_addresses_only_feed_the_tally() {
    let dir = tempfile::tempdir().unwrap();
    let report = ReportConfig::new().with_output_dir(dir.path());
    let checker = checker(&[("1.2.3.4:8080", 0.1)]);
    let candidates = vec!["1.2.3.4:8080".to_string(), "9.9.9.9:80".to_string()];

    let output = run_scan(&checker, &candidates, &report).await.unwrap();
    assert_eq!(output.results.len(), 1);

    // 9.9.9.9 burns three attempts on each protocol
    let tally = checker.tally();
    for protocol in Protocol::ALL {
        assert_eq!(tally.count(protocol, FailureKind::Timeout), 3);
    }
    assert_eq!(output.report.failures.len(), 3);
}

#[tokio::test]
async fn no_valid_candidates_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let report = ReportConfig::new().with_output_dir(&out);
    let checker = checker(&[]);
    let candidates = vec!["not a proxy".to_string(), "999.999.999.999:99999".to_string()];

    let err = run_scan(&checker, &candidates, &report).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScanError>(),
        Some(ScanError::NoProxiesLoaded)
    ));
    assert_eq!(err.to_string(), "No proxies loaded");
    assert!(!out.exists());
}

#[tokio::test]
async fn report_counts_raw_and_validated_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let report = ReportConfig::new().with_output_dir(dir.path());
    let checker = checker(&[("1.2.3.4:8080", 0.2)]);
    let candidates = vec![
        "1.2.3.4:8080".to_string(),
        "1.2.3.4:8080".to_string(),
        "300.1.1.1:80".to_string(),
        "1.2.3.4:0".to_string(),
    ];

    let output = run_scan(&checker, &candidates, &report).await.unwrap();
    assert_eq!(output.report.candidates, 4);
    assert_eq!(output.report.checked, 1);
    assert_eq!(output.results.len(), 1);
    assert_eq!(checker.tally().total(), 0);
}
