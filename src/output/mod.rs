//! Output module for audit summaries and reports
//!
//! This module handles:
//! - Turning an [`AuditOutcome`] into an [`AuditSummary`]
//! - Writing the markdown report and the JSON export
//! - Printing statistics to the console

mod json;
mod markdown;
mod stats;
mod traits;

pub use json::JsonReport;
pub use markdown::{format_markdown_report, MarkdownReport};
pub use stats::print_summary;
pub use traits::{AuditSummary, FailureRow, OutputError, OutputResult, PageRow, ReportWriter};

use crate::crawler::{AuditOutcome, FetchResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Builds the report summary for a finished audit
///
/// Page rows are ordered by click depth, orphans last, then by URL.
pub fn build_summary(outcome: &AuditOutcome, config_hash: Option<&str>) -> AuditSummary {
    let report = &outcome.report;
    let graph = &outcome.graph;

    // Node URLs are final URLs; a direct fetch of the URL wins over a redirect into it
    let mut fetch_index: HashMap<&Url, &FetchResult> = HashMap::new();
    for result in outcome.fetches.iter() {
        fetch_index.entry(&result.final_url).or_insert(result);
    }
    for result in outcome.fetches.iter() {
        fetch_index.insert(&result.url, result);
    }

    let mut inbound: HashMap<&Url, usize> = HashMap::new();
    let mut internal_links = 0;
    for url in graph.urls() {
        for target in graph.successors(url) {
            *inbound.entry(target).or_insert(0) += 1;
            internal_links += 1;
        }
    }

    let mut pages: Vec<PageRow> = graph
        .urls()
        .map(|url| {
            let fetch = fetch_index.get(url);
            PageRow {
                url: url.to_string(),
                reachable: report.is_reachable(url),
                click_depth: report.click_depth(url),
                status: fetch.and_then(|r| r.status),
                title: outcome.titles.get(url).cloned(),
                inbound_links: inbound.get(url).copied().unwrap_or(0),
                outbound_links: graph.successors(url).len(),
            }
        })
        .collect();
    pages.sort_by(|a, b| {
        let depth = |p: &PageRow| p.click_depth.unwrap_or(u32::MAX);
        depth(a).cmp(&depth(b)).then_with(|| a.url.cmp(&b.url))
    });

    let failures = outcome
        .fetches
        .failures()
        .into_iter()
        .filter_map(|r| {
            r.failure.map(|f| FailureRow {
                url: r.url.to_string(),
                reason: f.to_string(),
                status: r.status,
            })
        })
        .collect::<Vec<_>>();

    let sitemap_failures = outcome
        .sitemap
        .failures
        .iter()
        .map(|(url, reason)| FailureRow {
            url: url.to_string(),
            reason: reason.clone(),
            status: None,
        })
        .collect();

    let duration = outcome.finished_at - outcome.started_at;

    AuditSummary {
        base_url: outcome.base_url.to_string(),
        home_page: report.root.to_string(),
        started_at: outcome.started_at,
        finished_at: outcome.finished_at,
        duration_seconds: duration.num_milliseconds() as f64 / 1000.0,
        config_hash: config_hash.map(str::to_string),
        cancelled: outcome.cancelled,
        total_urls: report.total_urls(),
        reachable_urls: report.reachable.len(),
        orphan_urls: report.orphans.len(),
        average_click_depth: report.average_click_depth(),
        max_click_depth: report.max_click_depth(),
        pages_fetched: outcome.fetches.len(),
        fetch_failures: failures.len(),
        internal_links,
        sitemap_urls: outcome.sitemap.pages.len(),
        crawl_levels: outcome.crawl_levels,
        unvisited_urls: outcome.unvisited,
        depth_breakdown: report.depth_breakdown(),
        orphans: report.orphans.iter().map(Url::to_string).collect(),
        failures,
        sitemap_failures,
        pages,
    }
}

/// Writes the markdown report and, when a path is given, the JSON export
///
/// Returns the paths written.
pub fn write_reports(
    summary: &AuditSummary,
    report_path: &Path,
    json_path: Option<&Path>,
) -> OutputResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    MarkdownReport.write(summary, report_path)?;
    written.push(report_path.to_path_buf());

    if let Some(path) = json_path {
        JsonReport.write(summary, path)?;
        written.push(path.to_path_buf());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchBatch, PageLinkSet, RawResponse};
    use crate::crawler::{FetchFailure, SitemapExpansion};
    use crate::graph::{analyze, GraphBuilder};
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    fn ok(path: &str, final_path: &str) -> FetchResult {
        FetchResult::from_outcome(
            url(path),
            Ok(RawResponse {
                final_url: url(final_path),
                status: 200,
                content_type: Some("text/html".to_string()),
                body: String::new(),
            }),
            Duration::ZERO,
        )
    }

    fn outcome() -> AuditOutcome {
        let mut fetches = FetchBatch::new();
        fetches.insert(ok("/", "/"));
        fetches.insert(ok("/old", "/new"));
        fetches.insert(FetchResult::failed(
            url("/broken"),
            FetchFailure::HttpStatus(404),
            Duration::ZERO,
        ));
        fetches.insert(ok("/lost", "/lost"));

        let graph = GraphBuilder::new()
            .redirects(fetches.redirects())
            .known_urls([url("/"), url("/old"), url("/broken"), url("/lost")])
            .link_sets([PageLinkSet {
                source: url("/"),
                targets: vec![url("/old"), url("/broken")],
            }])
            .build();
        let report = analyze(&graph, &url("/")).unwrap();

        AuditOutcome {
            base_url: url("/"),
            graph,
            report,
            fetches,
            titles: HashMap::from([(url("/new"), "New".to_string())]),
            sitemap: SitemapExpansion {
                pages: vec![url("/lost")],
                sitemaps_read: 1,
                failures: vec![(url("/sitemap2.xml"), "HTTP 500".to_string())],
            },
            crawl_levels: 2,
            unvisited: 0,
            cancelled: false,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 5).unwrap(),
        }
    }

    #[test]
    fn test_build_summary_counts() {
        let summary = build_summary(&outcome(), Some("hash"));

        assert_eq!(summary.total_urls, 4);
        assert_eq!(summary.reachable_urls, 3);
        assert_eq!(summary.orphans, vec!["https://example.com/lost".to_string()]);
        assert_eq!(summary.internal_links, 2);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.failures[0].reason, "HTTP 404");
        assert_eq!(summary.sitemap_failures.len(), 1);
        assert_eq!(summary.duration_seconds, 5.0);
        assert_eq!(summary.config_hash.as_deref(), Some("hash"));
    }

    #[test]
    fn test_build_summary_rows() {
        let summary = build_summary(&outcome(), None);

        let urls: Vec<&str> = summary.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/broken",
                "https://example.com/new",
                "https://example.com/lost",
            ]
        );

        let redirected = &summary.pages[2];
        assert_eq!(redirected.status, Some(200));
        assert_eq!(redirected.title.as_deref(), Some("New"));
        assert_eq!(redirected.inbound_links, 1);

        let broken = &summary.pages[1];
        assert_eq!(broken.status, None);
        assert_eq!(broken.click_depth, Some(1));

        assert_eq!(summary.pages[0].outbound_links, 2);
        assert!(!summary.pages[3].reachable);
    }

    #[test]
    fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("report.md");
        let json = dir.path().join("report.json");
        let summary = build_summary(&outcome(), None);

        let written = write_reports(&summary, &md, Some(&json)).unwrap();

        assert_eq!(written, vec![md.clone(), json.clone()]);
        assert!(md.exists());
        assert!(json.exists());
    }

    #[test]
    fn test_write_reports_markdown_only() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("report.md");
        let summary = build_summary(&outcome(), None);

        let written = write_reports(&summary, &md, None).unwrap();
        assert_eq!(written.len(), 1);
    }
}
