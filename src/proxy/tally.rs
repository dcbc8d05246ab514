//! Shared counter of failed probe attempts

use crate::proxy::models::{FailureKind, Protocol};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Counts failed attempts per `(protocol, kind)`
///
/// Shared between all scan workers behind an `Arc`. Counts only ever grow.
#[derive(Debug, Default)]
pub struct ErrorTally {
    counts: Mutex<BTreeMap<(Protocol, FailureKind), u64>>,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failed attempt
    pub fn record(&self, protocol: Protocol, kind: FailureKind) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        *counts.entry((protocol, kind)).or_insert(0) += 1;
    }

    /// Number of failures recorded for one `(protocol, kind)` pair
    pub fn count(&self, protocol: Protocol, kind: FailureKind) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(&(protocol, kind)).copied().unwrap_or(0)
    }

    /// Total failed attempts across every protocol and kind
    pub fn total(&self) -> u64 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.values().sum()
    }

    /// Copy of the current counts, ordered by protocol then kind
    pub fn snapshot(&self) -> BTreeMap<(Protocol, FailureKind), u64> {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
