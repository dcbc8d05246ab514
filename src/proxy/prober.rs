//! Single connection attempts through a proxy

use crate::error::ProbeError;
use crate::proxy::checker::CheckerConfig;
use crate::proxy::models::{Address, Protocol, ProbeOutcome};
use crate::proxy::socks;
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::debug;

/// Performs one connection attempt through a proxy
///
/// Implementations must not panic or return errors: every failure is reported
/// as [`ProbeOutcome::Failure`].
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &Address, protocol: Protocol, timeout: Duration)
        -> ProbeOutcome;
}

/// Prober that talks to real proxies over the network
#[derive(Debug, Clone)]
pub struct NetworkProber {
    test_url: String,
    socks_host: String,
    socks_port: u16,
    verify_socks_response: bool,
}

impl NetworkProber {
    pub fn new(test_url: String, socks_host: String, socks_port: u16) -> Self {
        Self {
            test_url,
            socks_host,
            socks_port,
            verify_socks_response: true,
        }
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        Self {
            test_url: config.test_url.clone(),
            socks_host: config.socks_host.clone(),
            socks_port: config.socks_port,
            verify_socks_response: config.verify_socks_response,
        }
    }

    /// Only require the SOCKS CONNECT to succeed, skip the HTTP round trip
    pub fn without_socks_verification(mut self) -> Self {
        self.verify_socks_response = false;
        self
    }

    async fn attempt(
        &self,
        address: &Address,
        protocol: Protocol,
        timeout: Duration,
    ) -> Result<(), ProbeError> {
        match protocol {
            Protocol::Http => self.attempt_http(address, timeout).await,
            Protocol::Socks4 | Protocol::Socks5 => self.attempt_socks(address, protocol).await,
        }
    }

    async fn attempt_http(&self, address: &Address, timeout: Duration) -> Result<(), ProbeError> {
        let client = Self::create_client(address, timeout)?;
        let response = client.get(&self.test_url).send().await?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeError::Status(response.status().as_u16()))
        }
    }

    async fn attempt_socks(&self, address: &Address, protocol: Protocol) -> Result<(), ProbeError> {
        let mut stream = TcpStream::connect(SocketAddr::from((address.ip, address.port))).await?;

        if protocol == Protocol::Socks4 {
            socks::socks4_connect(&mut stream, &self.socks_host, self.socks_port).await?;
        } else {
            socks::socks5_connect(&mut stream, &self.socks_host, self.socks_port).await?;
        }

        if self.verify_socks_response {
            socks::http_roundtrip(&mut stream, &self.socks_host).await?;
        }

        Ok(())
    }

    /// Create a reqwest client routing every request through the proxy
    fn create_client(address: &Address, timeout: Duration) -> Result<Client, ProbeError> {
        let proxy = ReqwestProxy::all(format!("http://{}", address))?;

        let client = Client::builder().proxy(proxy).timeout(timeout).build()?;

        Ok(client)
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn probe(
        &self,
        address: &Address,
        protocol: Protocol,
        timeout: Duration,
    ) -> ProbeOutcome {
        let start = Instant::now();

        match tokio::time::timeout(timeout, self.attempt(address, protocol, timeout)).await {
            Ok(Ok(())) => ProbeOutcome::success(start.elapsed()),
            Ok(Err(e)) => {
                debug!("{} probe of {} failed: {}", protocol.label(), address, e);
                ProbeOutcome::failure(e.kind())
            }
            Err(_) => {
                let e = ProbeError::Timeout(timeout);
                debug!("{} probe of {} failed: {}", protocol.label(), address, e);
                ProbeOutcome::failure(e.kind())
            }
        }
    }
}
