//! Proxy checker module: retries, protocol fallback and the concurrent scan

use crate::error::ScanError;
use crate::proxy::models::{Address, FailureKind, Protocol, ProbeOutcome, ProxyResult};
use crate::proxy::parser::ProxyParser;
use crate::proxy::prober::{NetworkProber, Prober};
use crate::proxy::tally::ErrorTally;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Default timeout for each probe attempt in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent evaluations
const DEFAULT_CONCURRENCY: usize = 100;

/// Default number of attempts per protocol
const DEFAULT_MAX_RETRIES: usize = 3;

/// Default pause between a failed attempt and the next one
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Default URL fetched through HTTP proxies
const DEFAULT_TEST_URL: &str = "http://httpbin.org/ip";

/// Default host SOCKS proxies are asked to relay to
const DEFAULT_SOCKS_HOST: &str = "httpbin.org";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each probe attempt
    pub timeout: Duration,
    /// Number of addresses evaluated at once
    pub concurrency: usize,
    /// Attempts per protocol before moving on
    pub max_retries: usize,
    /// Pause between a failed attempt and its retry
    pub retry_backoff: Duration,
    /// URL to fetch through HTTP proxies
    pub test_url: String,
    /// Host SOCKS proxies relay to
    pub socks_host: String,
    /// Port SOCKS proxies relay to
    pub socks_port: u16,
    /// Require a non-empty reply through SOCKS relays
    pub verify_socks_response: bool,
    /// Protocols to try, always evaluated in priority order
    pub protocols: Vec<Protocol>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            test_url: DEFAULT_TEST_URL.to_string(),
            socks_host: DEFAULT_SOCKS_HOST.to_string(),
            socks_port: 80,
            verify_socks_response: true,
            protocols: Protocol::ALL.to_vec(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_socks_target(mut self, host: String, port: u16) -> Self {
        self.socks_host = host;
        self.socks_port = port;
        self
    }

    pub fn with_socks_verification(mut self, verify: bool) -> Self {
        self.verify_socks_response = verify;
        self
    }

    /// Restrict the protocols tried; order and duplicates in the input don't matter
    pub fn with_protocols(mut self, protocols: Vec<Protocol>) -> Self {
        let mut protocols = protocols;
        protocols.sort();
        protocols.dedup();
        if !protocols.is_empty() {
            self.protocols = protocols;
        }
        self
    }
}

/// Proxy checker driving probes across a candidate list
#[derive(Clone)]
pub struct ProxyChecker {
    config: CheckerConfig,
    prober: Arc<dyn Prober>,
    tally: Arc<ErrorTally>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker probing real proxies over the network
    pub fn with_config(config: CheckerConfig) -> Self {
        let prober = Arc::new(NetworkProber::from_config(&config));
        Self::with_prober(config, prober, Arc::new(ErrorTally::new()))
    }

    /// Create a proxy checker with an explicit prober and failure tally
    pub fn with_prober(
        config: CheckerConfig,
        prober: Arc<dyn Prober>,
        tally: Arc<ErrorTally>,
    ) -> Self {
        Self {
            config,
            prober,
            tally,
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Failure tally shared by every probe this checker runs
    pub fn tally(&self) -> &Arc<ErrorTally> {
        &self.tally
    }

    /// Probe one protocol up to `max_retries` times, stopping at the first success
    ///
    /// Every failed attempt is recorded in the tally, not just the last one.
    pub async fn probe_with_retry(&self, address: &Address, protocol: Protocol) -> ProbeOutcome {
        let max_retries = self.config.max_retries.max(1);
        let mut last_failure = FailureKind::Other;

        for attempt in 1..=max_retries {
            match self
                .prober
                .probe(address, protocol, self.config.timeout)
                .await
            {
                ProbeOutcome::Success { latency } => return ProbeOutcome::success(latency),
                ProbeOutcome::Failure { kind } => {
                    self.tally.record(protocol, kind);
                    last_failure = kind;
                }
            }

            if attempt < max_retries {
                warn!(
                    "Retrying {} proxy {} ({}/{})",
                    protocol.label(),
                    address,
                    attempt,
                    max_retries
                );
                if !self.config.retry_backoff.is_zero() {
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
            }
        }

        ProbeOutcome::failure(last_failure)
    }

    /// Try each protocol in priority order and return the first that works
    pub async fn evaluate(&self, address: &Address) -> Option<ProxyResult> {
        let mut last_failure = None;

        for &protocol in &self.config.protocols {
            match self.probe_with_retry(address, protocol).await {
                ProbeOutcome::Success { latency } => {
                    info!(
                        "{} proxy {} is working. Speed: {:.2}s",
                        protocol.label(),
                        address,
                        latency.as_secs_f64()
                    );
                    return Some(ProxyResult::new(*address, protocol, latency));
                }
                ProbeOutcome::Failure { kind } => last_failure = Some(kind),
            }
        }

        if let Some(kind) = last_failure {
            error!("Proxy {} is not working: {}", address, kind);
        }
        None
    }

    /// Evaluate validated addresses with at most `concurrency` in flight
    ///
    /// Evaluations start in input order and run to completion; the returned
    /// results are in completion order.
    pub async fn check_addresses(&self, addresses: Vec<Address>) -> Vec<ProxyResult> {
        let permits = self.config.concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();

        for address in addresses {
            // Acquiring before spawning keeps dispatch FIFO and the task count bounded
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let checker = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                checker.evaluate(&address).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => error!("Proxy evaluation task failed: {}", e),
            }
        }

        results
    }

    /// Validate raw candidates and scan every valid one
    ///
    /// Fails only when no candidate survives validation.
    pub async fn scan<I, S>(&self, candidates: I) -> Result<Vec<ProxyResult>, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scan_addresses(ProxyParser::parse_addresses(candidates))
            .await
    }

    /// Scan already validated addresses
    ///
    /// Fails only when `addresses` is empty.
    pub async fn scan_addresses(
        &self,
        addresses: Vec<Address>,
    ) -> Result<Vec<ProxyResult>, ScanError> {
        if addresses.is_empty() {
            return Err(ScanError::NoProxiesLoaded);
        }

        info!(
            "Checking {} proxies with {} workers, timeout: {}s",
            addresses.len(),
            self.config.concurrency,
            self.config.timeout.as_secs_f64()
        );
        Ok(self.check_addresses(addresses).await)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
