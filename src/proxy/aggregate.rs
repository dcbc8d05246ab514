//! Grouping and ranking of working proxies

use crate::proxy::models::{Address, Protocol, ProxyResult};
use std::collections::{BTreeMap, HashSet};

/// Working proxies partitioned by protocol, each partition fastest first
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    partitions: BTreeMap<Protocol, Vec<ProxyResult>>,
}

impl ResultSet {
    /// Group results by protocol and sort each group by ascending latency
    ///
    /// The sort is stable, so equal latencies keep their discovery order.
    pub fn aggregate(results: Vec<ProxyResult>) -> Self {
        let mut partitions: BTreeMap<Protocol, Vec<ProxyResult>> = BTreeMap::new();
        let mut seen = HashSet::new();
        for result in results {
            if seen.insert((result.protocol, result.address)) {
                partitions.entry(result.protocol).or_default().push(result);
            }
        }

        for partition in partitions.values_mut() {
            partition.sort_by_key(|r| r.latency);
        }

        Self { partitions }
    }

    /// Results for one protocol; empty if nothing worked over it
    pub fn partition(&self, protocol: Protocol) -> &[ProxyResult] {
        self.partitions
            .get(&protocol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-empty partitions in protocol priority order
    pub fn partitions(&self) -> impl Iterator<Item = (Protocol, &[ProxyResult])> {
        self.partitions
            .iter()
            .filter(|(_, results)| !results.is_empty())
            .map(|(protocol, results)| (*protocol, results.as_slice()))
    }

    /// Every working address across all protocols, deduplicated and sorted
    /// lexicographically by its `ip:port` text
    pub fn combined(&self) -> Vec<Address> {
        let mut seen = HashSet::new();
        let mut combined: Vec<Address> = self
            .partitions
            .values()
            .flatten()
            .map(|r| r.address)
            .filter(|address| seen.insert(*address))
            .collect();
        combined.sort_by_cached_key(|address| address.to_string());
        combined
    }

    /// Total number of working results
    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
