//! Proxy crawler module for loading candidate lists from sources
//!
//! A source is either a URL (anything starting with `http`) that is fetched,
//! or a path to a local file that is read. Every `ip:port` pattern found in the
//! text becomes a candidate.

use crate::proxy::parser::ProxyParser;
use crate::Result;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info};

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Result of loading a single source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The source that was loaded
    pub source: String,
    /// Unique candidates extracted from the source
    pub candidates: Vec<String>,
    /// Error message if loading failed
    pub error: Option<String>,
}

impl CrawlResult {
    /// Create a successful crawl result
    pub fn success(source: String, candidates: Vec<String>) -> Self {
        Self {
            source,
            candidates,
            error: None,
        }
    }

    /// Create a failed crawl result
    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            candidates: Vec::new(),
            error: Some(error),
        }
    }

    /// Check if the crawl was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for the source loader
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Loads proxy lists from URLs and files
pub struct ProxyCrawler {
    client: Client,
}

impl ProxyCrawler {
    /// Create a new crawler with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default())
    }

    /// Create a new crawler with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Split a comma-separated source list, trimming blanks
    pub fn split_sources(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Read the raw text behind a source
    pub async fn load_source(&self, source: &str) -> Result<String> {
        if source.starts_with("http") {
            let response = self.client.get(source).send().await?;
            Ok(response.text().await?)
        } else {
            Ok(tokio::fs::read_to_string(source).await?)
        }
    }

    /// Load a source and extract its unique candidates
    pub async fn crawl_source(&self, source: &str) -> Result<Vec<String>> {
        let content = self.load_source(source).await?;
        Ok(ProxyParser::extract_unique(&content))
    }

    /// Load every source in turn, returning a result for each
    pub async fn crawl_sources_with_results(&self, sources: &[String]) -> Vec<CrawlResult> {
        let mut results = Vec::new();

        for source in sources {
            let result = match self.crawl_source(source).await {
                Ok(candidates) => CrawlResult::success(source.clone(), candidates),
                Err(e) => CrawlResult::failure(source.clone(), e.to_string()),
            };
            results.push(result);
        }

        results
    }

    /// Load every source and merge the candidates, dropping cross-source duplicates
    ///
    /// Sources that fail to load are logged and skipped.
    pub async fn load_candidates(&self, sources: &[String]) -> Vec<String> {
        let results = self.crawl_sources_with_results(sources).await;
        for result in &results {
            match &result.error {
                None => info!(
                    "Loaded {} candidates from {}",
                    result.candidates.len(),
                    result.source
                ),
                Some(e) => error!("Error loading proxies from {}: {}", result.source, e),
            }
        }
        Self::merge_candidates(results)
    }

    /// Merge candidates from several results, keeping first-seen order
    pub fn merge_candidates(results: Vec<CrawlResult>) -> Vec<String> {
        let mut seen = HashSet::new();
        results
            .into_iter()
            .flat_map(|result| result.candidates)
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect()
    }
}
