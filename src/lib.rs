//! # vuln-export
//!
//! Bulk issue export and severity/status reporting for the Snyk Export API.
//!
//! ## Overview
//!
//! One run:
//! - **Submits** an asynchronous export job for a group or organization,
//!   restricted to issues introduced within a date range
//! - **Polls** the job until it is ready
//! - **Downloads** the result chunks one at a time
//! - **Parses** each chunk as CSV into typed issue records
//! - **Aggregates** severity counts per status and organization
//! - **Writes** per-status summary and issue CSV files, plus an optional
//!   whole-scope JSON report
//!
//! A failed chunk never aborts the run; the outcome records how many chunks
//! were requested and how many were processed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vuln_export::{Config, ExportPipeline, Scope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default().with_token_from_env();
//!     config.export.scope = Scope::Group("my-group-id".to_string());
//!     config.export.date_from = "2025-01-01".to_string();
//!     config.export.date_to = "2025-12-31".to_string();
//!
//!     let pipeline = ExportPipeline::new(config);
//!     pipeline.prepare_output().await?;
//!
//!     let outcome = vuln_export::run_until_signal(pipeline.run()).await?;
//!     println!(
//!         "{} records from {}/{} chunks",
//!         outcome.records, outcome.chunks_parsed, outcome.chunks_requested
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Severity/status aggregation
pub mod aggregate;
/// Export API client (submit, poll, download)
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// CSV chunk parsing
pub mod ingest;
/// Log setup for the binary
pub mod logging;
/// Run orchestration
pub mod pipeline;
/// Typed issue rows
pub mod record;
/// Report generation and artifacts
pub mod report;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use aggregate::{Aggregation, Aggregator, ScopeTotals, SeverityCounts, SummaryReport};
pub use client::{ExportClient, JobStatusPoller, JobSubmitter, ResultDownloader, Sleeper};
pub use config::Config;
pub use error::{
    DownloadError, Error, ErrorClass, ParseError, PollError, Result, SubmissionError,
};
pub use ingest::CsvIngester;
pub use pipeline::{ExportPipeline, RunOutcome};
pub use record::IssueRecord;
pub use report::{Report, ReportGenerator};
pub use types::{
    DateRange, ExportJob, ExportJobId, ExportRequest, JobState, ReportMode, ResultChunk,
    RunEvent, Scope, Severity,
};

/// Drive `run` to completion unless a termination signal arrives first
///
/// A signal drops the run in place, so no further requests are made and no
/// further artifacts are written, and yields [`Error::Interrupted`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_until_signal<F, T>(run: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    tokio::select! {
        result = run => result,
        _ = wait_for_signal() => {
            tracing::warn!("Run interrupted, no further requests will be made");
            Err(Error::Interrupted)
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    async fn recv(stream: &mut Option<Signal>) {
        match stream {
            Some(stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    // Either registration can fail in containers; fall back to ctrl_c when both do
    let mut term = signal(SignalKind::terminate())
        .inspect_err(|e| tracing::warn!(error = %e, "SIGTERM handler unavailable"))
        .ok();
    let mut int = signal(SignalKind::interrupt())
        .inspect_err(|e| tracing::warn!(error = %e, "SIGINT handler unavailable"))
        .ok();

    if term.is_none() && int.is_none() {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!(signal = "ctrl_c", "Stop requested");
        return;
    }

    let name = tokio::select! {
        _ = recv(&mut term) => "SIGTERM",
        _ = recv(&mut int) => "SIGINT",
    };
    tracing::info!(signal = name, "Stop requested");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C, running without interrupt support");
        std::future::pending::<()>().await;
    }
    tracing::info!(signal = "ctrl_c", "Stop requested");
}
