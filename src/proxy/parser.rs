//! Proxy parser module for validating and extracting candidate addresses

use crate::proxy::models::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Exact shape of a candidate proxy: four 1-3 digit groups and a 1-5 digit port
static VALID_PROXY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d{1,5}$")
        .expect("Invalid proxy validation regex")
});

/// Same shape, unanchored, for pulling candidates out of arbitrary text
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d{1,5}").expect("Invalid IP:PORT regex")
});

/// Proxy parser for validating and extracting `ip:port` candidates
pub struct ProxyParser;

impl ProxyParser {
    /// Check whether a string is syntactically an `IPv4:port` pair
    ///
    /// Only digit counts are checked here, so `999.999.999.999:99999` passes.
    /// Range checks happen in [`ProxyParser::parse_address`].
    pub fn is_valid(candidate: &str) -> bool {
        VALID_PROXY_REGEX.is_match(candidate)
    }

    /// Validate a candidate and turn it into an [`Address`]
    ///
    /// Returns `None` for anything that fails the syntactic check or has an
    /// octet above 255 or a port outside 1-65535.
    pub fn parse_address(candidate: &str) -> Option<Address> {
        let candidate = candidate.trim();
        if !Self::is_valid(candidate) {
            return None;
        }

        match candidate.parse() {
            Ok(address) => Some(address),
            Err(e) => {
                debug!("Dropping candidate {}: {}", candidate, e);
                None
            }
        }
    }

    /// Validate a list of candidates, dropping rejects and duplicates
    pub fn parse_addresses<I, S>(candidates: I) -> Vec<Address>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter_map(|candidate| Self::parse_address(candidate.as_ref()))
            .filter(|address| seen.insert(*address))
            .collect()
    }

    /// Extract every `ip:port` candidate from raw text, in order of appearance
    pub fn extract_candidates(content: &str) -> Vec<String> {
        IP_PORT_REGEX
            .find_iter(content)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Extract candidates and drop duplicates, keeping the first occurrence
    pub fn extract_unique(content: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        Self::extract_candidates(content)
            .into_iter()
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_simple() {
        assert!(ProxyParser::is_valid("192.168.1.1:8080"));
        assert!(ProxyParser::is_valid("1.2.3.4:1"));
    }

    #[test]
    fn test_is_valid_only_checks_digit_counts() {
        assert!(ProxyParser::is_valid("999.999.999.999:99999"));
        assert!(ProxyParser::is_valid("1.2.3.4:0"));
    }

    #[test]
    fn test_is_valid_rejects_malformed() {
        assert!(!ProxyParser::is_valid(""));
        assert!(!ProxyParser::is_valid("invalid"));
        assert!(!ProxyParser::is_valid("192.168.1.1"));
        assert!(!ProxyParser::is_valid("192.168.1.1:abc"));
        assert!(!ProxyParser::is_valid("1234.1.1.1:80"));
        assert!(!ProxyParser::is_valid("1.1.1.1:123456"));
        assert!(!ProxyParser::is_valid("1.1.1:80"));
        assert!(!ProxyParser::is_valid(" 1.1.1.1:80"));
        assert!(!ProxyParser::is_valid("1.1.1.1:80 "));
        assert!(!ProxyParser::is_valid("http://1.1.1.1:80"));
    }

    #[test]
    fn test_parse_address_enforces_ranges() {
        assert!(ProxyParser::parse_address("999.999.999.999:99999").is_none());
        assert!(ProxyParser::parse_address("1.2.3.4:0").is_none());
        assert!(ProxyParser::parse_address("1.2.3.4:65536").is_none());
        let address = ProxyParser::parse_address("1.2.3.4:65535").unwrap();
        assert_eq!(address.port, 65535);
    }

    #[test]
    fn test_parse_addresses_dedups() {
        let addresses = ProxyParser::parse_addresses([
            "1.2.3.4:8080",
            "garbage",
            "1.2.3.4:8080",
            "5.6.7.8:3128",
        ]);
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[0].to_string(), "1.2.3.4:8080");
        assert_eq!(addresses[1].to_string(), "5.6.7.8:3128");
    }

    #[test]
    fn test_extract_candidates_from_text() {
        let content = "1.2.3.4:8080 garbage 5.6.7.8:3128";
        let candidates = ProxyParser::extract_candidates(content);
        assert_eq!(candidates, vec!["1.2.3.4:8080", "5.6.7.8:3128"]);
    }

    #[test]
    fn test_extract_candidates_from_html_like_content() {
        let content = r#"
<table>
<tr><td>192.168.1.1</td><td>8080</td></tr>
</table>
Some text with 10.0.0.1:3128 embedded
"#;
        let candidates = ProxyParser::extract_candidates(content);
        assert_eq!(candidates, vec!["10.0.0.1:3128"]);
    }

    #[test]
    fn test_extract_unique() {
        let content = r#"
192.168.1.1:8080
192.168.1.1:8080
192.168.1.2:3128
192.168.1.1:8080
"#;
        let candidates = ProxyParser::extract_unique(content);
        assert_eq!(candidates, vec!["192.168.1.1:8080", "192.168.1.2:3128"]);
    }
}
