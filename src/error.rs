//! Error types

use crate::proxy::models::FailureKind;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while turning a string into an [`Address`](crate::proxy::Address)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("expected ip:port, got {0:?}")]
    Format(String),
    #[error("invalid IPv4 address: {0}")]
    Ip(String),
    #[error("invalid port: {0}")]
    Port(String),
}

/// Errors that end a scan before any proxy is probed
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No proxies loaded")]
    NoProxiesLoaded,
}

/// Everything that can go wrong during one probe attempt
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status: {0}")]
    Status(u16),
    #[error("SOCKS negotiation failed: {0}")]
    Negotiation(&'static str),
    #[error("SOCKS4 request rejected with code {0:#04x}")]
    Socks4Reply(u8),
    #[error("SOCKS5 request rejected with code {0:#04x}")]
    Socks5Reply(u8),
    #[error("empty response through proxy")]
    EmptyResponse,
}

impl ProbeError {
    /// Classify this error for the failure tally
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Timeout(_) => FailureKind::Timeout,
            ProbeError::Io(err) => io_kind(err),
            ProbeError::Http(err) => http_kind(err),
            ProbeError::Status(_) | ProbeError::EmptyResponse => FailureKind::UnexpectedResponse,
            ProbeError::Negotiation(_) | ProbeError::Socks4Reply(_) => {
                FailureKind::ProtocolNegotiation
            }
            ProbeError::Socks5Reply(code) => match code {
                0x04 => FailureKind::Resolution,
                0x05 => FailureKind::ConnectionRefused,
                0x06 => FailureKind::Timeout,
                _ => FailureKind::ProtocolNegotiation,
            },
        }
    }
}

fn io_kind(err: &io::Error) -> FailureKind {
    match err.kind() {
        io::ErrorKind::TimedOut => FailureKind::Timeout,
        io::ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
            FailureKind::ProtocolNegotiation
        }
        _ => FailureKind::Other,
    }
}

fn http_kind(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }
    if err.is_status() || err.is_decode() {
        return FailureKind::UnexpectedResponse;
    }

    // hyper buries the socket error a few levels down
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return io_kind(io_err);
        }
        if cause.to_string().contains("dns error") {
            return FailureKind::Resolution;
        }
        source = cause.source();
    }

    if err.is_connect() {
        FailureKind::ConnectionRefused
    } else {
        FailureKind::Other
    }
}
