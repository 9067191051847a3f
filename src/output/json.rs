//! JSON export of the audit summary

use crate::output::traits::{AuditSummary, OutputResult, ReportWriter};

/// Writes the audit summary as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport;

impl ReportWriter for JsonReport {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, summary: &AuditSummary) -> OutputResult<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}
