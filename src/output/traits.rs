//! Report writer traits and types
//!
//! This module defines the trait interface for report writers and the
//! summary data every report format renders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One known URL of the audited site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub url: String,

    /// Reachable from the home page by following links
    pub reachable: bool,

    /// Minimum clicks from the home page; `None` for orphans
    pub click_depth: Option<u32>,

    /// HTTP status, if the URL was fetched and answered
    pub status: Option<u16>,

    /// Page title (if available)
    pub title: Option<String>,

    /// Distinct pages linking here
    pub inbound_links: usize,

    /// Distinct internal pages linked from here
    pub outbound_links: usize,
}

/// A URL that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRow {
    pub url: String,

    /// Failure classification, e.g. `timeout` or `HTTP 404`
    pub reason: String,

    pub status: Option<u16>,
}

/// Summary of an audit, ready to render
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    // Run metadata
    pub base_url: String,
    pub home_page: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub config_hash: Option<String>,
    pub cancelled: bool,

    // Reachability
    pub total_urls: usize,
    pub reachable_urls: usize,
    pub orphan_urls: usize,
    pub average_click_depth: f64,
    pub max_click_depth: u32,

    // Crawl
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub internal_links: usize,
    pub sitemap_urls: usize,
    pub crawl_levels: u32,
    pub unvisited_urls: usize,

    // Click depth -> number of pages
    pub depth_breakdown: BTreeMap<u32, usize>,

    pub orphans: Vec<String>,
    pub failures: Vec<FailureRow>,
    pub sitemap_failures: Vec<FailureRow>,
    pub pages: Vec<PageRow>,
}

impl AuditSummary {
    /// Returns the share of known URLs reachable from the home page
    pub fn reachable_rate(&self) -> f64 {
        if self.total_urls == 0 {
            return 0.0;
        }
        (self.reachable_urls as f64 / self.total_urls as f64) * 100.0
    }

    /// Returns the share of fetched URLs that failed
    pub fn failure_rate(&self) -> f64 {
        if self.pages_fetched == 0 {
            return 0.0;
        }
        (self.fetch_failures as f64 / self.pages_fetched as f64) * 100.0
    }
}

/// Trait for report writers
///
/// Each writer renders an [`AuditSummary`] in one format.
pub trait ReportWriter {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Renders the summary
    fn render(&self, summary: &AuditSummary) -> OutputResult<String>;

    /// Renders the summary to `path`, creating parent directories as needed
    fn write(&self, summary: &AuditSummary, path: &Path) -> OutputResult<()> {
        let rendered = self.render(summary)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rendered)?;

        tracing::info!("Wrote {} report to {}", self.name(), path.display());
        Ok(())
    }
}
