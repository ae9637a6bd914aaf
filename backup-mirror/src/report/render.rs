//! Text and JSON renderings of a [`Report`].

use crate::report::format::{format_bytes, format_duration, format_signed_bytes, format_speed, throughput};
use crate::report::{Category, Report, ReportCounts};
use crate::utils::Result;
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct ReportDocument<'a> {
    #[serde(flatten)]
    report: &'a Report,
    counts: ReportCounts,
}

/// Pretty JSON: the report fields plus a `counts` object.
pub fn render_json(report: &Report) -> Result<String> {
    let document = ReportDocument {
        report,
        counts: report.counts(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Summary block followed by one indented tree per non-empty category.
pub fn render_text(report: &Report) -> String {
    let counts = report.counts();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Backup report {}", report.run_id());
    let _ = writeln!(out, "  Source:        {}", report.source().display());
    let _ = writeln!(out, "  Backup:        {}", report.backup().display());
    let _ = writeln!(
        out,
        "  Started:       {}",
        report.started_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "  Elapsed:       {}", format_duration(report.elapsed()));
    let _ = writeln!(out, "  Directories:   {} created", counts.created_directories);
    let _ = writeln!(
        out,
        "  Files:         {} transferred, {} updated, {} skipped, {} failed",
        counts.transferred, counts.updated, counts.skipped, counts.failed
    );
    let _ = writeln!(
        out,
        "  Bytes added:   {} ({} copied, {})",
        format_signed_bytes(report.total_bytes_added()),
        format_bytes(report.bytes_copied()),
        format_speed(throughput(report.bytes_copied(), report.elapsed()))
    );

    for category in Category::ALL {
        let tree = report.tree(category);
        if tree.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({}):", category.title(), report.entries(category).len());
        for line in tree.render().lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    if !report.failed().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failure details:");
        for failure in report.failed() {
            let _ = writeln!(out, "  {} [{}] {}", failure.entry, failure.kind, failure.reason);
        }
    }

    out
}
