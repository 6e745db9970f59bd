//! Colored terminal rendering of report tables

use colored::{ColoredString, Colorize};

use super::{ScopeSummaryDocument, StatusTable, writer::SUMMARY_HEADER};
use crate::aggregate::{SeverityCounts, SeverityStats};

const SEVERITY_LABELS: [&str; 4] = ["Critical", "High", "Medium", "Low"];

fn severity_cell(label: &str, text: String) -> ColoredString {
    match label {
        "Critical" => text.red().bold(),
        "High" => text.yellow().bold(),
        "Medium" => text.cyan(),
        _ => text.white(),
    }
}

fn counts_cells(counts: &SeverityCounts) -> [u64; 4] {
    [counts.critical, counts.high, counts.medium, counts.low]
}

/// One status table: organizations by severity, plus a total row
pub fn render_status_table(table: &StatusTable) -> String {
    let org_width = table
        .rows
        .iter()
        .map(|r| r.org.chars().count())
        .chain([SUMMARY_HEADER[0].len(), "TOTAL".len()])
        .max()
        .unwrap_or_default();
    let num_width = SUMMARY_HEADER[1..]
        .iter()
        .map(|h| h.len())
        .max()
        .unwrap_or_default();
    let rule = "-".repeat(org_width + 4 * (num_width + 2));

    let mut output = String::new();
    output.push_str(&format!(
        "{}\n",
        format!("Results Review - Status: {}", table.status).bold()
    ));

    let mut header = format!("{:<org_width$}", SUMMARY_HEADER[0]);
    for column in &SUMMARY_HEADER[1..] {
        header.push_str(&format!("  {column:>num_width$}"));
    }
    output.push_str(&format!("{}\n{}\n", header.cyan().bold(), rule.dimmed()));

    for row in &table.rows {
        output.push_str(&format!("{}", format!("{:<org_width$}", row.org).cyan()));
        for (label, value) in SEVERITY_LABELS.iter().zip(counts_cells(&row.counts)) {
            output.push_str(&format!(
                "  {}",
                severity_cell(label, format!("{value:>num_width$}"))
            ));
        }
        output.push('\n');
    }

    let totals = table.totals();
    output.push_str(&format!("{}\n", rule.dimmed()));
    let mut total_line = format!("{:<org_width$}", "TOTAL");
    for value in counts_cells(&totals) {
        total_line.push_str(&format!("  {value:>num_width$}"));
    }
    output.push_str(&format!("{}\n", total_line.bold()));
    output
}

/// Single-scope severity buckets with their status sub-counts
pub fn render_scope_summary(summary: &ScopeSummaryDocument) -> String {
    let scope = summary
        .org_id
        .as_deref()
        .map(|id| format!("org {id}"))
        .or_else(|| summary.group_id.as_deref().map(|id| format!("group {id}")))
        .unwrap_or_default();

    let mut output = String::new();
    output.push_str(&format!(
        "{}\n",
        format!(
            "Severity report for {scope} ({} to {})",
            summary.date_from, summary.date_to
        )
        .bold()
    ));
    output.push_str(&format!(
        "{}\n",
        format!(
            "{:<10}  {:>8}  {:>8}  {:>8}  {:>8}",
            "SEVERITY", "TOTAL", "OPEN", "IGNORED", "RESOLVED"
        )
        .cyan()
        .bold()
    ));

    let report = &summary.report;
    let buckets: [(&str, &SeverityStats); 4] = [
        ("Critical", &report.critical),
        ("High", &report.high),
        ("Medium", &report.medium),
        ("Low", &report.low),
    ];
    for (label, stats) in buckets {
        output.push_str(&format!(
            "{}  {:>8}  {:>8}  {:>8}  {:>8}\n",
            severity_cell(label, format!("{label:<10}")),
            stats.total,
            stats.open,
            stats.ignored,
            stats.resolved
        ));
    }
    output
}
