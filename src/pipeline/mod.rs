//! Run orchestration
//!
//! [`ExportPipeline`] sequences one export run:
//! submit -> poll -> save listing -> download and ingest each chunk ->
//! aggregate -> write report artifacts.
//!
//! Validation, submission and polling failures end the run. Chunk download
//! and parse failures are logged, counted in the [`RunOutcome`], and the run
//! continues with the remaining chunks.


use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::client::{
    DownloadedChunk, ExportClient, JobStatusPoller, JobSubmitter, ResultDownloader, Sleeper,
    TokioSleeper,
};
use crate::config::Config;
use crate::error::{ParseError, Result};
use crate::ingest::CsvIngester;
use crate::report::{ArtifactWriter, Report, ReportGenerator};
use crate::types::{ExportJobId, ReportMode, RunEvent};
use crate::utils::{clear_output_dir, today};

/// Summary of a completed run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// Export job id
    pub job_id: ExportJobId,
    /// Row count declared by the result listing
    pub declared_rows: u64,
    /// Chunks listed by the service
    pub chunks_requested: usize,
    /// Chunks fetched
    pub chunks_downloaded: usize,
    /// Chunks parsed to the end
    pub chunks_parsed: usize,
    /// Records aggregated
    pub records: u64,
    /// Records whose severity was not recognized
    pub unrecognized: u64,
    /// One message per chunk that failed
    pub warnings: Vec<String>,
    /// Every file written during the run
    pub artifacts: Vec<PathBuf>,
    /// Effective report mode
    pub mode: ReportMode,
    /// The generated report
    pub report: Report,
}

impl RunOutcome {
    /// Whether every listed chunk was downloaded and parsed
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty() && self.chunks_parsed == self.chunks_requested
    }
}

/// Runs exports for one configuration
pub struct ExportPipeline {
    config: Config,
    sleeper: Arc<dyn Sleeper>,
    event_tx: broadcast::Sender<RunEvent>,
    report_date: Option<NaiveDate>,
}

impl ExportPipeline {
    /// Pipeline that sleeps on the tokio timer between polls
    pub fn new(config: Config) -> Self {
        let (event_tx, _rx) = broadcast::channel(256);
        Self {
            config,
            sleeper: Arc::new(TokioSleeper),
            event_tx,
            report_date: None,
        }
    }

    /// Replace the poll delay implementation
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Stamp reports with `date` instead of today's date
    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to progress events
    ///
    /// Events are dropped when nobody listens.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: RunEvent) {
        self.event_tx.send(event).ok();
    }

    /// Create the output folder and, unless disabled, empty it
    ///
    /// Returns the number of entries removed.
    pub async fn prepare_output(&self) -> Result<usize> {
        let dir = &self.config.output.dir;
        if self.config.output.clear_before_run {
            clear_output_dir(dir).await
        } else {
            tokio::fs::create_dir_all(dir).await?;
            Ok(0)
        }
    }

    /// Execute one export run
    ///
    /// # Errors
    ///
    /// Any fatal error: invalid configuration (checked before any request),
    /// a rejected submission, a failed job or status check, or a failure to
    /// write the listing or report artifacts.
    pub async fn run(&self) -> Result<RunOutcome> {
        self.config.validate()?;
        let request = self.config.export_request()?;
        let client = ExportClient::new(&self.config.api)?;
        let dir = self.config.output.dir.as_path();
        tokio::fs::create_dir_all(dir).await?;

        info!(
            scope = %request.scope,
            date_from = %request.range.from_date(),
            date_to = %request.range.to_date(),
            output = %dir.display(),
            api_url = %self.config.api.base_url,
            api_version = %self.config.api.version,
            "Export run starting"
        );

        let mut job = JobSubmitter::new(&client).submit(&request).await?;
        self.emit_event(RunEvent::JobSubmitted {
            job_id: job.id().clone(),
        });

        let mut poller = JobStatusPoller::new(
            &client,
            &request.scope,
            &self.config.poll,
            self.sleeper.as_ref(),
        );
        let results = poller.wait_for_results(&mut job).await?;
        info!(
            job_id = %job.id(),
            total_rows = results.row_count,
            chunks = results.chunks.len(),
            "Export completed"
        );
        self.emit_event(RunEvent::ResultsReady {
            job_id: job.id().clone(),
            total_rows: results.row_count,
            chunks: results.chunks.len(),
        });

        let writer = ArtifactWriter::new(dir);
        let mut artifacts = vec![writer.write_result_json(&results.raw).await?];
        self.emit_event(RunEvent::ResultSaved {
            path: artifacts[0].clone(),
        });

        let mut aggregator = Aggregator::new();
        let mut header: Vec<String> = Vec::new();
        let mut warnings = Vec::new();
        let mut parsed = 0;

        let downloaded = ResultDownloader::new(&client)
            .saving_to(dir)
            .fetch_each(&results.chunks, |outcome| match outcome {
                Ok(chunk) => {
                    artifacts.extend(chunk.path.clone());
                    match ingest_chunk(&chunk, &mut aggregator, &mut header) {
                        Ok(records) => {
                            parsed += 1;
                            info!(chunk = chunk.index, records, "Processed result chunk");
                            self.emit_event(RunEvent::ChunkProcessed {
                                index: chunk.index,
                                records,
                            });
                        }
                        Err(e) => {
                            warn!(chunk = chunk.index, error = %e, "Abandoning rest of result chunk");
                            warnings.push(e.to_string());
                            self.emit_event(RunEvent::ChunkFailed {
                                index: chunk.index,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    warnings.push(e.to_string());
                    self.emit_event(RunEvent::ChunkFailed {
                        index: e.index(),
                        reason: e.to_string(),
                    });
                }
            })
            .await;

        let requested = results.chunks.len();
        self.emit_event(RunEvent::DownloadsFinished {
            requested,
            downloaded,
            parsed,
        });
        if parsed < requested {
            warn!(
                requested,
                downloaded,
                parsed,
                "Not every result chunk was processed, the report is partial"
            );
        }

        let aggregation = aggregator.finish();
        let mode = self.config.report_mode();
        let date = self.report_date.unwrap_or_else(today);
        let report = ReportGenerator::new(mode, &request.scope, &request.range, date)
            .generate(&aggregation, &header);
        let report_files = writer.write_report(&report).await?;
        self.emit_event(RunEvent::ReportWritten {
            statuses: report.tables.len(),
            files: report_files.len(),
        });
        artifacts.extend(report_files);

        info!(
            job_id = %job.id(),
            chunks_requested = requested,
            chunks_processed = parsed,
            records = aggregation.records,
            unrecognized = aggregation.unrecognized,
            "Export run finished"
        );

        Ok(RunOutcome {
            job_id: job.id().clone(),
            declared_rows: results.row_count,
            chunks_requested: requested,
            chunks_downloaded: downloaded,
            chunks_parsed: parsed,
            records: aggregation.records,
            unrecognized: aggregation.unrecognized,
            warnings,
            artifacts,
            mode,
            report,
        })
    }
}

/// Feed one chunk into the aggregator
///
/// Rows before a malformed row are kept. The header of the first readable
/// chunk becomes the listing header. A chunk whose row count differs from
/// the count its listing entry declared is reported as a parse failure even
/// though its rows stay aggregated.
fn ingest_chunk(
    chunk: &DownloadedChunk,
    aggregator: &mut Aggregator,
    header: &mut Vec<String>,
) -> std::result::Result<u64, ParseError> {
    let ingester = CsvIngester::new(chunk.index, &chunk.data)?;
    if header.is_empty() {
        *header = ingester.header().to_vec();
    }
    let mut records = 0;
    for record in ingester {
        aggregator.add(record?);
        records += 1;
    }
    match chunk.declared_rows {
        Some(declared) if declared != records => Err(ParseError::RowCount {
            index: chunk.index,
            declared,
            parsed: records,
        }),
        _ => Ok(records),
    }
}
