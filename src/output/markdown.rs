//! Markdown report generation
//!
//! This module generates the human-readable audit report: run information,
//! reachability statistics, click depth breakdown, orphan pages, fetch
//! failures and a per-URL table.

use crate::output::traits::{AuditSummary, OutputResult, ReportWriter};

/// Writes the audit as a markdown document
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReport;

impl ReportWriter for MarkdownReport {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, summary: &AuditSummary) -> OutputResult<String> {
        Ok(format_markdown_report(summary))
    }
}

/// Escapes text for use inside a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Formats an audit summary as markdown
pub fn format_markdown_report(summary: &AuditSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# SEO Reachability Report\n\n");

    if summary.cancelled {
        md.push_str(
            "> **Partial results.** The audit was cancelled before all pages were fetched.\n\n",
        );
    }

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Base URL**: {}\n", summary.base_url));
    md.push_str(&format!("- **Home Page**: {}\n", summary.home_page));
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
        summary.duration_seconds,
        summary.duration_seconds / 60.0
    ));
    md.push_str(&format!(
        "- **Status**: {}\n",
        if summary.cancelled {
            "cancelled"
        } else {
            "completed"
        }
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Known URLs**: {}\n", summary.total_urls));
    md.push_str(&format!(
        "- **Reachable from Home**: {} ({:.2}%)\n",
        summary.reachable_urls,
        summary.reachable_rate()
    ));
    md.push_str(&format!("- **Orphan Pages**: {}\n", summary.orphan_urls));
    md.push_str(&format!(
        "- **Average Clicks from Home**: {:.2}\n",
        summary.average_click_depth
    ));
    md.push_str(&format!(
        "- **Maximum Clicks from Home**: {}\n",
        summary.max_click_depth
    ));
    md.push_str(&format!("- **Internal Links**: {}\n", summary.internal_links));
    md.push_str(&format!("- **URLs Fetched**: {}\n", summary.pages_fetched));
    md.push_str(&format!(
        "- **Fetch Failures**: {} ({:.2}%)\n",
        summary.fetch_failures,
        summary.failure_rate()
    ));
    md.push_str(&format!("- **Sitemap URLs**: {}\n", summary.sitemap_urls));
    md.push_str(&format!("- **Crawl Levels**: {}\n", summary.crawl_levels));
    if summary.unvisited_urls > 0 {
        md.push_str(&format!(
            "- **Left Unfetched (page limit)**: {}\n",
            summary.unvisited_urls
        ));
    }
    md.push('\n');

    // Depth breakdown
    if !summary.depth_breakdown.is_empty() {
        md.push_str("## Click Depth Breakdown\n\n");
        md.push_str("| Clicks | Pages |\n");
        md.push_str("|--------|-------|\n");
        for (depth, count) in &summary.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    // Orphans
    md.push_str("## Orphan Pages\n\n");
    if summary.orphans.is_empty() {
        md.push_str("No orphan pages found.\n\n");
    } else {
        md.push_str(&format!(
            "{} known URLs cannot be reached by following links from the home page.\n\n",
            summary.orphans.len()
        ));
        for url in &summary.orphans {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    // Fetch failures
    if !summary.failures.is_empty() {
        md.push_str("## Fetch Failures\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");
        for failure in &summary.failures {
            md.push_str(&format!(
                "| {} | {} |\n",
                cell(&failure.url),
                cell(&failure.reason)
            ));
        }
        md.push('\n');
    }

    if !summary.sitemap_failures.is_empty() {
        md.push_str("## Sitemap Problems\n\n");
        for failure in &summary.sitemap_failures {
            md.push_str(&format!("- {}: {}\n", failure.url, failure.reason));
        }
        md.push('\n');
    }

    // Per-URL table
    if !summary.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Status | Clicks | Inbound | Outbound | Title |\n");
        md.push_str("|-----|--------|--------|---------|----------|-------|\n");
        for page in &summary.pages {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                cell(&page.url),
                page.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                page.click_depth
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "orphan".to_string()),
                page.inbound_links,
                page.outbound_links,
                cell(page.title.as_deref().unwrap_or(""))
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::traits::fixtures;

    #[test]
    fn test_format_markdown_report() {
        let markdown = format_markdown_report(&fixtures::summary());

        assert!(markdown.contains("# SEO Reachability Report"));
        assert!(markdown.contains("## Run Information"));
        assert!(markdown.contains("- **Started**: 2024-01-01 00:00:00 UTC"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Status**: completed"));
        assert!(markdown.contains("- **Reachable from Home**: 3 (75.00%)"));
        assert!(!markdown.contains("Partial results"));
    }

    #[test]
    fn test_markdown_depth_breakdown() {
        let markdown = format_markdown_report(&fixtures::summary());

        assert!(markdown.contains("## Click Depth Breakdown"));
        assert!(markdown.contains("| 0 | 1 |"));
        assert!(markdown.contains("| 2 | 1 |"));
    }

    #[test]
    fn test_markdown_orphans_and_failures() {
        let markdown = format_markdown_report(&fixtures::summary());

        assert!(markdown.contains("- https://example.com/lost"));
        assert!(markdown.contains("| https://example.com/broken | HTTP 404 |"));
    }

    #[test]
    fn test_markdown_page_table_escapes_titles() {
        let markdown = format_markdown_report(&fixtures::summary());

        assert!(markdown.contains("| https://example.com/ | 200 | 0 | 0 | 1 | Home \\| Example |"));
        assert!(markdown.contains("| https://example.com/lost | 200 | orphan | 0 | 0 |  |"));
    }

    #[test]
    fn test_markdown_cancelled_banner() {
        let mut summary = fixtures::summary();
        summary.cancelled = true;

        let markdown = format_markdown_report(&summary);
        assert!(markdown.contains("Partial results"));
        assert!(markdown.contains("- **Status**: cancelled"));
    }

    #[test]
    fn test_markdown_no_orphans() {
        let mut summary = fixtures::summary();
        summary.orphans.clear();

        let markdown = format_markdown_report(&summary);
        assert!(markdown.contains("No orphan pages found."));
    }

    #[test]
    fn test_markdown_writer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        MarkdownReport.write(&fixtures::summary(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# SEO Reachability Report"));
    }
}
