//! Severity/status aggregation over parsed issue records
//!
//! The [`Aggregator`] is owned by the pipeline for the duration of one run and
//! consumed once at the end. It builds three views in a single pass:
//! - a [`SummaryReport`]: status -> organization -> [`SeverityCounts`]
//! - [`ScopeTotals`]: severity -> total/open/ignored/resolved
//! - per-status issue listings for lossless pass-through
//!
//! Only the four literal severities are counted. A record with any other
//! severity still joins its status group and listing.

mod summary;
mod totals;


pub use summary::{OrgCounts, SeverityCounts, StatusSummary, SummaryReport};
pub use totals::{ScopeTotals, SeverityStats};

use tracing::trace;

use crate::record::IssueRecord;

/// Every record of one status, in input order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueListing {
    /// Status label
    pub status: String,
    /// Records with that status
    pub records: Vec<IssueRecord>,
}

/// Output of one aggregation pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Status -> organization -> counts
    pub summary: SummaryReport,
    /// Severity -> status sub-counts for the whole scope
    pub totals: ScopeTotals,
    /// Per-status listings, same order as `summary.statuses()`
    pub listings: Vec<IssueListing>,
    /// Records consumed
    pub records: u64,
    /// Records whose severity was not one of the four literals
    pub unrecognized: u64,
}

/// Accumulates counts over a stream of records
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Aggregation,
    retain_listings: bool,
}

impl Aggregator {
    /// Aggregator that also keeps per-status listings
    pub fn new() -> Self {
        Self {
            state: Aggregation::default(),
            retain_listings: true,
        }
    }

    /// Aggregator that only counts
    pub fn counts_only() -> Self {
        Self::default()
    }

    /// Consume one record
    pub fn add(&mut self, record: IssueRecord) {
        let severity = record.severity();
        let status = record.status_label();

        self.state.records += 1;
        self.state.totals.record(&severity, record.status());

        let counted = self
            .state
            .summary
            .status_mut(status)
            .record(record.org_display_name(), &severity);
        if !counted {
            self.state.unrecognized += 1;
            trace!(
                severity = %severity,
                status = %status,
                org = %record.org_display_name(),
                "severity not recognized, excluded from counts"
            );
        }

        if self.retain_listings {
            self.push_listing(record);
        }
    }

    /// Records consumed so far
    pub fn records(&self) -> u64 {
        self.state.records
    }

    /// Finish the pass
    pub fn finish(self) -> Aggregation {
        self.state
    }

    fn push_listing(&mut self, record: IssueRecord) {
        let status = record.status_label().to_string();
        let listings = &mut self.state.listings;
        match listings.iter_mut().find(|l| l.status == status) {
            Some(listing) => listing.records.push(record),
            None => listings.push(IssueListing {
                status,
                records: vec![record],
            }),
        }
    }
}

impl Extend<IssueRecord> for Aggregator {
    fn extend<I: IntoIterator<Item = IssueRecord>>(&mut self, iter: I) {
        for record in iter {
            self.add(record);
        }
    }
}
