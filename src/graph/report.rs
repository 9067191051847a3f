use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Reachability of every known URL from the root
///
/// `reachable` and `orphans` partition the graph's nodes; the root is always
/// reachable at depth 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachabilityReport {
    pub root: Url,
    pub reachable: BTreeSet<Url>,
    pub orphans: BTreeSet<Url>,
    /// Minimum number of clicks from the root, reachable URLs only
    pub click_depths: BTreeMap<Url, u32>,
}

impl ReachabilityReport {
    pub fn is_reachable(&self, url: &Url) -> bool {
        self.reachable.contains(url)
    }

    pub fn is_orphan(&self, url: &Url) -> bool {
        self.orphans.contains(url)
    }

    /// Clicks from the root; `None` for orphans and unknown URLs
    pub fn click_depth(&self, url: &Url) -> Option<u32> {
        self.click_depths.get(url).copied()
    }

    pub fn total_urls(&self) -> usize {
        self.reachable.len() + self.orphans.len()
    }

    /// Mean click depth over reachable URLs, root included
    pub fn average_click_depth(&self) -> f64 {
        if self.click_depths.is_empty() {
            return 0.0;
        }
        let total: u64 = self.click_depths.values().map(|&d| d as u64).sum();
        total as f64 / self.click_depths.len() as f64
    }

    pub fn max_click_depth(&self) -> u32 {
        self.click_depths.values().copied().max().unwrap_or(0)
    }

    /// Number of reachable URLs at each click depth
    pub fn depth_breakdown(&self) -> BTreeMap<u32, usize> {
        let mut breakdown = BTreeMap::new();
        for &depth in self.click_depths.values() {
            *breakdown.entry(depth).or_insert(0) += 1;
        }
        breakdown
    }

    /// Share of known URLs reachable from the root, in percent
    pub fn reachable_percentage(&self) -> f64 {
        match self.total_urls() {
            0 => 0.0,
            total => self.reachable.len() as f64 / total as f64 * 100.0,
        }
    }
}
