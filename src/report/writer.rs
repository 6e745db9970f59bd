//! Persisting report artifacts into the output folder

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{Report, ScopeSummaryDocument, StatusListing, StatusTable};
use crate::aggregate::{OrgCounts, SeverityCounts};
use crate::error::Result;

/// Header of every `summary-<status>.csv`
pub const SUMMARY_HEADER: [&str; 5] = ["ORG_DISPLAY_NAME", "CRITICAL", "HIGH", "MEDIUM", "LOW"];

#[derive(Debug, Serialize, Deserialize)]
struct SummaryRow {
    #[serde(rename = "ORG_DISPLAY_NAME")]
    org: String,
    #[serde(rename = "CRITICAL")]
    critical: u64,
    #[serde(rename = "HIGH")]
    high: u64,
    #[serde(rename = "MEDIUM")]
    medium: u64,
    #[serde(rename = "LOW")]
    low: u64,
}

impl From<&OrgCounts> for SummaryRow {
    fn from(row: &OrgCounts) -> Self {
        Self {
            org: row.org.clone(),
            critical: row.counts.critical,
            high: row.counts.high,
            medium: row.counts.medium,
            low: row.counts.low,
        }
    }
}

impl From<SummaryRow> for OrgCounts {
    fn from(row: SummaryRow) -> Self {
        OrgCounts {
            org: row.org,
            counts: SeverityCounts {
                critical: row.critical,
                high: row.high,
                medium: row.medium,
                low: row.low,
            },
        }
    }
}

/// Writes artifacts under one directory
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Writer targeting `dir`, which must already exist
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pretty-printed copy of the job-result response, as `result.json`
    pub async fn write_result_json(&self, raw: &serde_json::Value) -> Result<PathBuf> {
        let path = self.dir.join("result.json");
        let json = serde_json::to_string_pretty(raw)?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "Saved job result");
        Ok(path)
    }

    /// Every artifact of `report`, returning the written paths
    pub async fn write_report(&self, report: &Report) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for listing in &report.listings {
            written.push(self.write_listing(listing).await?);
        }
        for table in &report.tables {
            written.push(self.write_summary(table).await?);
        }
        if let Some(summary) = &report.scope_summary {
            written.push(self.write_scope_summary(summary).await?);
        }
        Ok(written)
    }

    /// `issues-<status>.csv`
    pub async fn write_listing(&self, listing: &StatusListing) -> Result<PathBuf> {
        let path = self.dir.join(format!("issues-{}.csv", listing.file_stem));
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&listing.header)?;
        for row in &listing.rows {
            writer.write_record(row)?;
        }
        save_csv(&path, writer).await?;
        info!(path = %path.display(), issues = listing.rows.len(), "Saved issue listing");
        Ok(path)
    }

    /// `summary-<status>.csv`
    pub async fn write_summary(&self, table: &StatusTable) -> Result<PathBuf> {
        let path = self.dir.join(format!("summary-{}.csv", table.file_stem));
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(SUMMARY_HEADER)?;
        for row in &table.rows {
            writer.serialize(SummaryRow::from(row))?;
        }
        save_csv(&path, writer).await?;
        info!(path = %path.display(), organizations = table.rows.len(), "Saved status summary");
        Ok(path)
    }

    /// `report_<date>.json`
    pub async fn write_scope_summary(&self, summary: &ScopeSummaryDocument) -> Result<PathBuf> {
        let path = self.dir.join(summary.file_name());
        let json = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "Saved scope report");
        Ok(path)
    }
}

async fn save_csv(path: &Path, writer: csv::Writer<Vec<u8>>) -> Result<()> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Read a `summary-<status>.csv` back into per-organization counts
pub fn read_summary_csv(path: &Path) -> Result<Vec<OrgCounts>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<SummaryRow>() {
        rows.push(row?.into());
    }
    Ok(rows)
}
