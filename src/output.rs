//! CLI output formatting for all pipeline commands.
//!
//! Each command has a `format_*` function returning `Vec<String>` — pure,
//! no I/O, unit testable — and the binary prints the lines. Counts lead,
//! per-file context is indented underneath:
//!
//! ```text
//! Imported
//!     42 posts
//!     5 pages
//!     128 attachments
//!
//! Derived 384 variants (120 up to date, 2 failed)
//!     failed: public/wp-content/uploads/2019/corrupt.jpg: Failed to decode
//! ```

use crate::audit::{DeleteOutcome, UnusedReport};
use crate::derive::DeriveSummary;
use crate::import::ExportData;
use crate::migrate::MigrateSummary;
use crate::rewrite::RewriteSummary;
use std::path::PathBuf;

fn indent(line: impl AsRef<str>) -> String {
    format!("    {}", line.as_ref())
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

// ============================================================================
// Import
// ============================================================================

pub fn format_import_summary(data: &ExportData) -> Vec<String> {
    let mut lines = vec!["Imported".to_string()];
    lines.push(indent(plural(data.posts.len(), "post")));
    lines.push(indent(plural(data.pages.len(), "page")));
    lines.push(indent(plural(data.attachments.len(), "attachment")));
    if let Some(newest) = data.posts.first() {
        lines.push(indent(format!("newest: {} ({})", newest.slug, newest.date)));
    }
    lines
}

// ============================================================================
// Migration
// ============================================================================

pub fn format_migrate_summary(summary: &MigrateSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Migrated {} ({} already local, {} failed)",
        plural(summary.downloaded, "download"),
        summary.skipped,
        summary.failed
    )];
    lines.push(indent(format!(
        "{} localized",
        plural(summary.attachments_localized, "attachment")
    )));
    lines.push(indent(format!(
        "{} and {} rewritten",
        plural(summary.posts_rewritten, "post"),
        plural(summary.pages_rewritten, "page"),
    )));
    if summary.failed > 0 {
        lines.push(indent(
            "failed downloads keep their remote URL and retry next run",
        ));
    }
    lines
}

// ============================================================================
// Rewrite
// ============================================================================

pub fn format_rewrite_summary(summary: &RewriteSummary) -> Vec<String> {
    vec![format!(
        "Rewrote {} and {}",
        plural(summary.posts_changed, "post"),
        plural(summary.pages_changed, "page"),
    )]
}

// ============================================================================
// Derivation
// ============================================================================

pub fn format_derive_summary(summary: &DeriveSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Derived {} from {} ({} up to date, {} failed)",
        plural(summary.generated, "variant"),
        plural(summary.sources, "source"),
        summary.skipped,
        summary.failures.len(),
    )];
    for (path, error) in &summary.failures {
        lines.push(indent(format!("failed: {}: {}", path.display(), error)));
    }
    lines
}

// ============================================================================
// Audit
// ============================================================================

pub fn format_unused_report(report: &UnusedReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Scanned {} against {} — {} unused ({})",
        plural(report.scanned, "image"),
        plural(report.referenced, "reference"),
        report.unused.len(),
        megabytes(report.total_bytes),
    )];
    for path in &report.unused {
        lines.push(indent(path.display().to_string()));
    }
    if !report.unused.is_empty() {
        lines.push("Run with --delete to remove them".to_string());
    }
    lines
}

pub fn format_duplicate_report(duplicates: &[PathBuf]) -> Vec<String> {
    let mut lines = vec![format!(
        "{} with compounded derivation suffixes",
        plural(duplicates.len(), "file")
    )];
    for path in duplicates {
        lines.push(indent(path.display().to_string()));
    }
    if !duplicates.is_empty() {
        lines.push("Run with --delete to remove them".to_string());
    }
    lines
}

pub fn format_delete_outcome(outcome: &DeleteOutcome) -> Vec<String> {
    let mut lines = vec![format!("Deleted {}", plural(outcome.deleted, "file"))];
    for (path, error) in &outcome.failed {
        lines.push(indent(format!("failed: {}: {}", path.display(), error)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Post;

    #[test]
    fn import_summary_leads_with_counts() {
        let data = ExportData {
            posts: vec![Post {
                id: 1,
                slug: "hello".to_string(),
                date: "2024-06-01 10:00:00".to_string(),
                ..Post::default()
            }],
            pages: vec![],
            attachments: vec![],
        };
        let lines = format_import_summary(&data);
        assert_eq!(lines[0], "Imported");
        assert_eq!(lines[1], "    1 post");
        assert_eq!(lines[2], "    0 pages");
        assert!(lines[4].contains("hello"));
    }

    #[test]
    fn derive_summary_lists_failures_indented() {
        let summary = DeriveSummary {
            sources: 3,
            generated: 10,
            skipped: 2,
            failures: vec![(PathBuf::from("a/bad.jpg"), "decode error".to_string())],
        };
        let lines = format_derive_summary(&summary);
        assert!(lines[0].contains("10 variants"));
        assert!(lines[0].contains("3 sources"));
        assert_eq!(lines[1], "    failed: a/bad.jpg: decode error");
    }

    #[test]
    fn unused_report_shows_megabytes() {
        let report = UnusedReport {
            referenced: 5,
            scanned: 2,
            unused: vec![PathBuf::from("public/b.jpg")],
            total_bytes: 3 * 1024 * 1024,
        };
        let lines = format_unused_report(&report);
        assert!(lines[0].contains("3.00 MB"));
        assert!(lines.last().unwrap().contains("--delete"));
    }

    #[test]
    fn clean_unused_report_has_no_delete_hint() {
        let lines = format_unused_report(&UnusedReport::default());
        assert_eq!(lines.len(), 1);
    }
}
