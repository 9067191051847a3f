use super::builder::ReachabilityGraph;
use super::report::ReachabilityReport;
use crate::url::normalize_parsed;
use crate::ReachError;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use url::Url;

/// Computes reachability and click depth of every node from `root`
///
/// One breadth-first traversal from the root gives both the reachable set and
/// the minimum click count of each reachable node. Nodes never visited are
/// orphans. The root is normalized and resolved through redirect aliases
/// before lookup.
///
/// # Errors
///
/// Returns [`ReachError::RootNotInGraph`] if the root is not a node, and a
/// URL error if it is not an http(s) URL.
///
/// # Example
///
/// ```
/// use seo_reach::{analyze, build_graph};
/// use seo_reach::crawler::PageLinkSet;
/// use url::Url;
///
/// let home = Url::parse("https://example.com/").unwrap();
/// let about = Url::parse("https://example.com/about").unwrap();
/// let lost = Url::parse("https://example.com/lost").unwrap();
///
/// let graph = build_graph(
///     &[PageLinkSet { source: home.clone(), targets: vec![about.clone()] }],
///     [&home, &about, &lost],
/// );
/// let report = analyze(&graph, &home).unwrap();
///
/// assert_eq!(report.click_depth(&about), Some(1));
/// assert!(report.is_orphan(&lost));
/// ```
pub fn analyze(graph: &ReachabilityGraph, root: &Url) -> Result<ReachabilityReport, ReachError> {
    let normalized = normalize_parsed(root.clone())?;
    let canonical_root = graph.canonical(&normalized);

    let root_id = graph
        .node_id(canonical_root)
        .ok_or_else(|| ReachError::RootNotInGraph {
            root: normalized.to_string(),
        })?;

    let mut depth: Vec<Option<u32>> = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();

    depth[root_id] = Some(0);
    queue.push_back(root_id);

    while let Some(current) = queue.pop_front() {
        let next_depth = depth[current].unwrap_or(0) + 1;
        for successor in graph.successor_ids(current) {
            if depth[successor].is_none() {
                depth[successor] = Some(next_depth);
                queue.push_back(successor);
            }
        }
    }

    let mut reachable = BTreeSet::new();
    let mut orphans = BTreeSet::new();
    let mut click_depths = BTreeMap::new();

    for (id, node_depth) in depth.into_iter().enumerate() {
        let url = graph.url(id).clone();
        match node_depth {
            Some(d) => {
                click_depths.insert(url.clone(), d);
                reachable.insert(url);
            }
            None => {
                orphans.insert(url);
            }
        }
    }

    tracing::info!(
        "{} of {} URLs reachable from {}, {} orphans",
        reachable.len(),
        graph.node_count(),
        graph.url(root_id),
        orphans.len()
    );

    Ok(ReachabilityReport {
        root: graph.url(root_id).clone(),
        reachable,
        orphans,
        click_depths,
    })
}
