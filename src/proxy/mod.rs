//! Proxy module for validating, probing and ranking proxies
//!
//! This module provides functionality for:
//! - Loading candidate lists from URLs and files and extracting `ip:port` pairs
//! - Probing each candidate over HTTP, SOCKS4 and SOCKS5 with retries
//! - Scanning many candidates concurrently under a fixed worker limit
//! - Grouping working proxies by protocol and ranking them by latency

pub mod aggregate;
pub mod checker;
pub mod crawler;
pub mod models;
pub mod parser;
pub mod prober;
pub mod socks;
pub mod tally;

pub use aggregate::ResultSet;
pub use checker::{CheckerConfig, ProxyChecker};
pub use crawler::{CrawlResult, CrawlerConfig, ProxyCrawler};
pub use models::{Address, FailureKind, Protocol, ProbeOutcome, ProxyResult};
pub use parser::ProxyParser;
pub use prober::{NetworkProber, Prober};
pub use tally::ErrorTally;
