//! Proxy data models

use crate::error::AddressParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

/// Proxy protocol, ordered by evaluation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Socks4,
    Socks5,
}

impl Protocol {
    /// Every protocol in the order proxies are evaluated
    pub const ALL: [Protocol; 3] = [Protocol::Http, Protocol::Socks4, Protocol::Socks5];

    /// Upper-case label used in console output
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Socks4 => "SOCKS4",
            Protocol::Socks5 => "SOCKS5",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Socks4 => write!(f, "socks4"),
            Protocol::Socks5 => write!(f, "socks5"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "socks4" => Ok(Protocol::Socks4),
            "socks5" => Ok(Protocol::Socks5),
            _ => Err(format!(
                "Invalid protocol: {}. Use: http, socks4, socks5",
                s
            )),
        }
    }
}

/// A validated IPv4 proxy endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Address {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self { ip, port }
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Parses `ip:port`, requiring every octet to be 0-255 and the port 1-65535
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, port) = s
            .split_once(':')
            .ok_or_else(|| AddressParseError::Format(s.to_string()))?;

        // Octets are parsed one by one so zero-padded lists ("010.000.000.001") still load
        let octets = ip
            .split('.')
            .map(|octet| octet.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AddressParseError::Ip(ip.to_string()))?;
        let ip = match octets[..] {
            [a, b, c, d] => Ipv4Addr::new(a, b, c, d),
            _ => return Err(AddressParseError::Ip(ip.to_string())),
        };
        let port: u16 = port
            .parse()
            .map_err(|_| AddressParseError::Port(port.to_string()))?;
        if port == 0 {
            return Err(AddressParseError::Port(port.to_string()));
        }

        Ok(Self { ip, port })
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Classification of a failed probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    Resolution,
    ProtocolNegotiation,
    UnexpectedResponse,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Timeout => "Timeout",
            FailureKind::ConnectionRefused => "ConnectionRefused",
            FailureKind::Resolution => "Resolution",
            FailureKind::ProtocolNegotiation => "ProtocolNegotiation",
            FailureKind::UnexpectedResponse => "UnexpectedResponse",
            FailureKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Outcome of a single probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success { latency: Duration },
    Failure { kind: FailureKind },
}

impl ProbeOutcome {
    pub fn success(latency: Duration) -> Self {
        ProbeOutcome::Success { latency }
    }

    pub fn failure(kind: FailureKind) -> Self {
        ProbeOutcome::Failure { kind }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// A working proxy together with the protocol that succeeded and its latency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResult {
    pub address: Address,
    pub protocol: Protocol,
    pub latency: Duration,
}

impl ProxyResult {
    pub fn new(address: Address, protocol: Protocol, latency: Duration) -> Self {
        Self {
            address,
            protocol,
            latency,
        }
    }

    /// Latency in milliseconds, as stored in reports
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }
}

impl fmt::Display for ProxyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Speed: {:.2}s",
            self.address,
            self.latency.as_secs_f64()
        )
    }
}
