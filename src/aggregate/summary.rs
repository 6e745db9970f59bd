//! Per-status, per-organization severity counts

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::Severity;

/// Number of issues at each recognized severity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Critical issues
    pub critical: u64,
    /// High issues
    pub high: u64,
    /// Medium issues
    pub medium: u64,
    /// Low issues
    pub low: u64,
}

impl SeverityCounts {
    /// Count one issue; returns false (and counts nothing) for unrecognized severities
    pub fn record(&mut self, severity: &Severity) -> bool {
        let slot = match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Unrecognized(_) => return false,
        };
        *slot += 1;
        true
    }

    /// Sum over the four severities
    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

/// Counts for one organization within a status group
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgCounts {
    /// Organization display name
    pub org: String,
    /// Severity counts
    pub counts: SeverityCounts,
}

/// All organizations seen with one status label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSummary {
    status: String,
    orgs: Vec<OrgCounts>,
    org_index: HashMap<String, usize>,
    records: u64,
}

impl StatusSummary {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            orgs: Vec::new(),
            org_index: HashMap::new(),
            records: 0,
        }
    }

    /// Status label
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Organizations in first-seen order
    pub fn organizations(&self) -> &[OrgCounts] {
        &self.orgs
    }

    /// Counts for one organization
    pub fn counts_for(&self, org: &str) -> Option<&SeverityCounts> {
        self.org_index.get(org).map(|&i| &self.orgs[i].counts)
    }

    /// Records in this status group, counted or not
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Records that landed in a severity column
    pub fn counted(&self) -> u64 {
        self.orgs.iter().map(|o| o.counts.total()).sum()
    }

    pub(crate) fn record(&mut self, org: &str, severity: &Severity) -> bool {
        self.records += 1;
        let slot = match self.org_index.get(org) {
            Some(&i) => i,
            None => {
                self.orgs.push(OrgCounts {
                    org: org.to_string(),
                    counts: SeverityCounts::default(),
                });
                self.org_index.insert(org.to_string(), self.orgs.len() - 1);
                self.orgs.len() - 1
            }
        };
        self.orgs[slot].counts.record(severity)
    }
}

/// Severity counts grouped by status, then organization
///
/// Statuses and organizations keep the order in which they were first seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryReport {
    statuses: Vec<StatusSummary>,
    index: HashMap<String, usize>,
}

impl SummaryReport {
    /// Status groups in first-seen order
    pub fn statuses(&self) -> &[StatusSummary] {
        &self.statuses
    }

    /// One status group
    pub fn status(&self, label: &str) -> Option<&StatusSummary> {
        self.index.get(label).map(|&i| &self.statuses[i])
    }

    /// Whether no record was seen
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Records across all status groups
    pub fn record_count(&self) -> u64 {
        self.statuses.iter().map(StatusSummary::record_count).sum()
    }

    pub(crate) fn status_mut(&mut self, label: &str) -> &mut StatusSummary {
        let slot = match self.index.get(label) {
            Some(&i) => i,
            None => {
                self.statuses.push(StatusSummary::new(label));
                self.index.insert(label.to_string(), self.statuses.len() - 1);
                self.statuses.len() - 1
            }
        };
        &mut self.statuses[slot]
    }
}
