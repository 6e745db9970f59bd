//! Whole-scope totals, one bucket per severity

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Issue counts for one severity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityStats {
    /// Every issue at this severity
    pub total: u64,
    /// Status "Open"
    pub open: u64,
    /// Status "Ignored"
    pub ignored: u64,
    /// Status "Resolved"
    pub resolved: u64,
}

/// Totals for the single-scope report
///
/// Only the three listed status labels have sub-counters; any other status
/// still adds to its severity's `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTotals {
    /// Critical issues
    pub critical: SeverityStats,
    /// High issues
    pub high: SeverityStats,
    /// Medium issues
    pub medium: SeverityStats,
    /// Low issues
    pub low: SeverityStats,
}

impl ScopeTotals {
    /// Count one issue; unrecognized severities are ignored
    pub fn record(&mut self, severity: &Severity, status: Option<&str>) {
        let bucket = match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Unrecognized(_) => return,
        };
        bucket.total += 1;
        match status {
            Some("Open") => bucket.open += 1,
            Some("Ignored") => bucket.ignored += 1,
            Some("Resolved") => bucket.resolved += 1,
            _ => {}
        }
    }

    /// Issues across all four severities
    pub fn total(&self) -> u64 {
        self.critical.total + self.high.total + self.medium.total + self.low.total
    }
}
