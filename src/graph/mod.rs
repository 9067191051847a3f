//! Link graph and reachability analysis
//!
//! [`build_graph`] / [`GraphBuilder`] turn extracted link sets into a
//! directed graph over the site's known URLs; [`analyze`] walks it from the
//! home page to find orphans and click depths.

mod analyzer;
mod builder;
mod report;

pub use analyzer::analyze;
pub use builder::{build_graph, GraphBuilder, NodeId, ReachabilityGraph};
pub use report::ReachabilityReport;
