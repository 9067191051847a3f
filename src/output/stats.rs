//! Console statistics for a finished audit

use crate::output::traits::AuditSummary;

/// Prints audit statistics to stdout
pub fn print_summary(summary: &AuditSummary) {
    println!("=== Reachability Audit ===\n");

    if summary.cancelled {
        println!("Audit cancelled: results are partial\n");
    }

    println!("Overview:");
    println!("  Base URL: {}", summary.base_url);
    println!("  Home page: {}", summary.home_page);
    println!("  Known URLs: {}", summary.total_urls);
    println!(
        "  Reachable: {} ({:.1}%)",
        summary.reachable_urls,
        summary.reachable_rate()
    );
    println!("  Orphans: {}", summary.orphan_urls);
    println!(
        "  Clicks from home: avg {:.2}, max {}",
        summary.average_click_depth, summary.max_click_depth
    );
    println!();

    println!("Fetching:");
    println!("  URLs fetched: {}", summary.pages_fetched);
    println!(
        "  Failures: {} ({:.1}%)",
        summary.fetch_failures,
        summary.failure_rate()
    );
    println!("  Duration: {:.1}s", summary.duration_seconds);
    println!();

    if !summary.depth_breakdown.is_empty() {
        println!("Pages by Click Depth:");
        for (depth, count) in &summary.depth_breakdown {
            println!("  {}: {}", depth, count);
        }
        println!();
    }

    if !summary.orphans.is_empty() {
        println!("Orphan Pages ({}):", summary.orphans.len());
        for url in summary.orphans.iter().take(20) {
            println!("  {}", url);
        }
        if summary.orphans.len() > 20 {
            println!("  ... and {} more", summary.orphans.len() - 20);
        }
        println!();
    }
}
