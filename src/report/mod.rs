//! Report generation
//!
//! [`ReportGenerator`] turns an [`Aggregation`] into plain serializable
//! structures. Writing them is left to [`ArtifactWriter`] and printing to the
//! [`console`] helpers, so the transformation itself never touches I/O.

pub mod console;
mod writer;


pub use writer::{ArtifactWriter, SUMMARY_HEADER, read_summary_csv};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::aggregate::{Aggregation, OrgCounts, ScopeTotals};
use crate::types::{DateRange, ReportMode, Scope};
use crate::utils::{date_stamp, safe_status_filename};

/// Per-organization counts for one status, as written to `summary-<status>.csv`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusTable {
    /// Status label, verbatim
    pub status: String,
    /// Filesystem-safe name used for this status' files
    pub file_stem: String,
    /// Rows in first-seen organization order
    pub rows: Vec<OrgCounts>,
}

impl StatusTable {
    /// Column sums over all organizations
    pub fn totals(&self) -> crate::aggregate::SeverityCounts {
        self.rows.iter().fold(Default::default(), |mut acc, row| {
            acc.critical += row.counts.critical;
            acc.high += row.counts.high;
            acc.medium += row.counts.medium;
            acc.low += row.counts.low;
            acc
        })
    }
}

/// Every issue of one status, as written to `issues-<status>.csv`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusListing {
    /// Status label, verbatim
    pub status: String,
    /// Filesystem-safe name used for this status' files
    pub file_stem: String,
    /// Column names
    pub header: Vec<String>,
    /// One row per issue; columns the issue did not have are empty
    pub rows: Vec<Vec<String>>,
}

/// Whole-scope summary written as `report_<date>.json`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSummaryDocument {
    /// Generation date, `YYYY-MM-DD`
    pub date: String,
    /// Organization id, for an organization scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// Group id, for a group scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// First day of the exported range
    pub date_from: String,
    /// Last day of the exported range
    pub date_to: String,
    /// Severity -> total/open/ignored/resolved
    pub report: ScopeTotals,
}

impl ScopeSummaryDocument {
    /// File name for this document
    pub fn file_name(&self) -> String {
        format!("report_{}.json", self.date)
    }
}

/// Everything derived from one aggregation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// One table per status, in first-seen order
    pub tables: Vec<StatusTable>,
    /// One listing per status, same order as `tables`
    pub listings: Vec<StatusListing>,
    /// Present in single-scope mode
    pub scope_summary: Option<ScopeSummaryDocument>,
}

/// Builds a [`Report`] for one run
#[derive(Clone, Debug)]
pub struct ReportGenerator<'a> {
    mode: ReportMode,
    scope: &'a Scope,
    range: &'a DateRange,
    date: NaiveDate,
}

impl<'a> ReportGenerator<'a> {
    /// Generator stamped with `date`
    pub fn new(mode: ReportMode, scope: &'a Scope, range: &'a DateRange, date: NaiveDate) -> Self {
        Self {
            mode,
            scope,
            range,
            date,
        }
    }

    /// Transform an aggregation
    ///
    /// `header` is the column list of the first parsed chunk. Without it no
    /// listing can be laid out, so listings are omitted.
    pub fn generate(&self, aggregation: &Aggregation, header: &[String]) -> Report {
        let mut stems = FileStems::default();
        let tables: Vec<StatusTable> = aggregation
            .summary
            .statuses()
            .iter()
            .map(|group| StatusTable {
                status: group.status().to_string(),
                file_stem: stems.claim(group.status()),
                rows: group.organizations().to_vec(),
            })
            .collect();

        let listings = if header.is_empty() {
            Vec::new()
        } else {
            aggregation
                .listings
                .iter()
                .map(|listing| StatusListing {
                    status: listing.status.clone(),
                    file_stem: tables
                        .iter()
                        .find(|t| t.status == listing.status)
                        .map(|t| t.file_stem.clone())
                        .unwrap_or_else(|| safe_status_filename(&listing.status)),
                    header: header.to_vec(),
                    rows: listing
                        .records
                        .iter()
                        .map(|record| {
                            header
                                .iter()
                                .map(|column| record.get(column).unwrap_or_default().to_string())
                                .collect()
                        })
                        .collect(),
                })
                .collect()
        };

        let scope_summary = match self.mode {
            ReportMode::SingleScope => Some(self.scope_summary(&aggregation.totals)),
            ReportMode::Organizations => None,
        };

        Report {
            tables,
            listings,
            scope_summary,
        }
    }

    fn scope_summary(&self, totals: &ScopeTotals) -> ScopeSummaryDocument {
        let (org_id, group_id) = match self.scope {
            Scope::Org(id) => (Some(id.clone()), None),
            Scope::Group(id) => (None, Some(id.clone())),
        };
        ScopeSummaryDocument {
            date: date_stamp(self.date),
            org_id,
            group_id,
            date_from: date_stamp(self.range.from_date()),
            date_to: date_stamp(self.range.to_date()),
            report: *totals,
        }
    }
}

/// Hands out distinct file stems
///
/// Two labels can sanitize to the same name (`a/b` and `a|b`); later ones get
/// a numeric suffix so no artifact overwrites another.
#[derive(Debug, Default)]
struct FileStems {
    taken: HashSet<String>,
}

impl FileStems {
    fn claim(&mut self, status: &str) -> String {
        let base = safe_status_filename(status);
        let mut stem = base.clone();
        let mut n = 1;
        while !self.taken.insert(stem.clone()) {
            n += 1;
            stem = format!("{base} ({n})");
        }
        stem
    }
}
