use crate::crawler::PageLinkSet;
use crate::url::normalize_parsed;
use std::collections::{BTreeSet, HashMap};
use url::Url;

/// Dense node handle inside a [`ReachabilityGraph`]
pub type NodeId = usize;

/// Longest redirect chain followed when canonicalizing a URL
const MAX_ALIAS_HOPS: usize = 16;

/// Directed link graph over the known URLs of one site
///
/// Nodes are normalized URLs, an edge `a -> b` means page `a` links to `b`.
/// Parallel links collapse into a single edge. Requested URLs that redirected
/// are stored as aliases of their destination rather than as nodes.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityGraph {
    nodes: Vec<Url>,
    index: HashMap<Url, NodeId>,
    edges: Vec<BTreeSet<NodeId>>,
    aliases: HashMap<Url, Url>,
}

impl ReachabilityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(BTreeSet::len).sum()
    }

    /// Follows redirect aliases to the URL that identifies the page
    pub fn canonical<'a>(&'a self, url: &'a Url) -> &'a Url {
        let mut current = url;
        for _ in 0..MAX_ALIAS_HOPS {
            match self.aliases.get(current) {
                Some(next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }

    /// Looks up a node, normalizing `url` when it is not stored as given
    pub fn node_id(&self, url: &Url) -> Option<NodeId> {
        if let Some(&id) = self.index.get(self.canonical(url)) {
            return Some(id);
        }
        let normalized = normalize_parsed(url.clone()).ok()?;
        self.index.get(self.canonical(&normalized)).copied()
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.node_id(url).is_some()
    }

    pub fn url(&self, id: NodeId) -> &Url {
        &self.nodes[id]
    }

    /// All nodes in insertion order
    pub fn urls(&self) -> impl Iterator<Item = &Url> {
        self.nodes.iter()
    }

    pub(crate) fn successor_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges[id].iter().copied()
    }

    /// Pages `url` links to
    pub fn successors(&self, url: &Url) -> Vec<&Url> {
        match self.node_id(url) {
            Some(id) => self.successor_ids(id).map(|s| &self.nodes[s]).collect(),
            None => Vec::new(),
        }
    }

    pub fn has_edge(&self, from: &Url, to: &Url) -> bool {
        match (self.node_id(from), self.node_id(to)) {
            (Some(a), Some(b)) => self.edges[a].contains(&b),
            _ => false,
        }
    }

    /// Number of distinct pages linking to `url`
    pub fn in_degree(&self, url: &Url) -> usize {
        match self.node_id(url) {
            Some(id) => self.edges.iter().filter(|e| e.contains(&id)).count(),
            None => 0,
        }
    }

    /// Redirect aliases, requested URL to destination
    pub fn aliases(&self) -> &HashMap<Url, Url> {
        &self.aliases
    }

    fn add_node(&mut self, url: Url) -> NodeId {
        if let Some(&id) = self.index.get(&url) {
            return id;
        }
        let id = self.nodes.len();
        self.index.insert(url.clone(), id);
        self.nodes.push(url);
        self.edges.push(BTreeSet::new());
        id
    }

    /// Normalizes and canonicalizes `url`, then inserts it
    ///
    /// URLs that cannot be normalized are skipped.
    fn add_url(&mut self, url: Url) -> Option<NodeId> {
        match normalize_parsed(url.clone()) {
            Ok(normalized) => {
                let canonical = self.canonical(&normalized).clone();
                Some(self.add_node(canonical))
            }
            Err(e) => {
                tracing::debug!("Skipping {} in link graph: {}", url, e);
                None
            }
        }
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.edges[from].insert(to);
    }
}

/// Assembles a [`ReachabilityGraph`]
///
/// # Example
///
/// ```
/// use seo_reach::graph::GraphBuilder;
/// use seo_reach::crawler::PageLinkSet;
/// use url::Url;
///
/// let home = Url::parse("https://example.com/").unwrap();
/// let about = Url::parse("https://example.com/about").unwrap();
///
/// let graph = GraphBuilder::new()
///     .known_urls([home.clone(), about.clone()])
///     .link_sets([PageLinkSet { source: home.clone(), targets: vec![about.clone()] }])
///     .build();
///
/// assert!(graph.has_edge(&home, &about));
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    known: Vec<Url>,
    link_sets: Vec<PageLinkSet>,
    redirects: HashMap<Url, Url>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs that become nodes even with no links in or out
    pub fn known_urls<I: IntoIterator<Item = Url>>(mut self, urls: I) -> Self {
        self.known.extend(urls);
        self
    }

    pub fn link_sets<I: IntoIterator<Item = PageLinkSet>>(mut self, link_sets: I) -> Self {
        self.link_sets.extend(link_sets);
        self
    }

    /// Requested URL to final URL; both map to the final URL's node
    pub fn redirects<I: IntoIterator<Item = (Url, Url)>>(mut self, redirects: I) -> Self {
        self.redirects.extend(redirects);
        self
    }

    pub fn build(self) -> ReachabilityGraph {
        let mut graph = ReachabilityGraph::default();

        for (from, to) in self.redirects {
            match (normalize_parsed(from), normalize_parsed(to)) {
                (Ok(from), Ok(to)) if from != to => {
                    graph.aliases.insert(from, to);
                }
                (Ok(_), Ok(_)) => {}
                (Err(e), _) | (_, Err(e)) => tracing::debug!("Skipping redirect alias: {}", e),
            }
        }

        for url in self.known {
            graph.add_url(url);
        }

        for link_set in self.link_sets {
            let Some(from) = graph.add_url(link_set.source) else {
                continue;
            };

            for target in link_set.targets {
                if let Some(to) = graph.add_url(target) {
                    graph.add_edge(from, to);
                }
            }
        }

        tracing::debug!(
            "Built graph with {} nodes, {} edges and {} redirect aliases",
            graph.node_count(),
            graph.edge_count(),
            graph.aliases.len()
        );

        graph
    }
}

/// Builds the graph from extracted link sets and the known URL universe
///
/// Every known URL becomes a node, link sources and targets are added as
/// nodes when not already present, and each link becomes one directed edge.
pub fn build_graph<'a, I>(link_sets: &[PageLinkSet], known_urls: I) -> ReachabilityGraph
where
    I: IntoIterator<Item = &'a Url>,
{
    GraphBuilder::new()
        .known_urls(known_urls.into_iter().cloned())
        .link_sets(link_sets.iter().cloned())
        .build()
}
