//! Job status polling and result listing

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ExportClient;
use super::wire::{JobStatusBody, ResultListingBody};
use crate::config::PollConfig;
use crate::error::{PollError, Result};
use crate::types::{ExportJob, JobState, ResultChunk, Scope};

/// Delay between polls
///
/// The production implementation sleeps on the tokio timer. Tests substitute
/// a recorder so terminal-state scenarios run without real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result listing of a ready job
#[derive(Clone, Debug, Default)]
pub struct ExportResults {
    /// Downloadable chunks, in listing order
    pub chunks: Vec<ResultChunk>,
    /// Declared total row count
    pub row_count: u64,
    /// Status reported alongside the listing
    pub status: Option<JobState>,
    /// The full response, for persisting as-is
    pub raw: serde_json::Value,
}

/// Waits for an export job to become ready
///
/// `PENDING` sleeps one interval and asks again. `STARTED`, `FINISHED` and a
/// response without a status all count as ready. `ERROR`, any unknown label
/// and any non-200 answer end the run.
pub struct JobStatusPoller<'a> {
    client: &'a ExportClient,
    scope: &'a Scope,
    config: &'a PollConfig,
    sleeper: &'a dyn Sleeper,
    waited: Duration,
}

impl<'a> JobStatusPoller<'a> {
    /// Poller for jobs in `scope`
    pub fn new(
        client: &'a ExportClient,
        scope: &'a Scope,
        config: &'a PollConfig,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            client,
            scope,
            config,
            sleeper,
            waited: Duration::ZERO,
        }
    }

    /// Total time spent sleeping so far
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Poll until the job is ready for download
    ///
    /// Returns the number of status queries made.
    pub async fn wait_until_ready(&mut self, job: &mut ExportJob) -> Result<u32> {
        let url = self.client.status_url(self.scope, job.id())?;
        info!(job_id = %job.id(), "Waiting for export job");

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let response = self
                .client
                .api_request(Method::GET, url.clone())
                .send()
                .await?;
            let status = response.status();
            let text = response.text().await?;

            if status != StatusCode::OK {
                return Err(PollError::HttpStatus {
                    job_id: job.id().to_string(),
                    status: status.as_u16(),
                    body: text,
                }
                .into());
            }

            let body: JobStatusBody =
                serde_json::from_str(&text).map_err(|e| PollError::MalformedResponse {
                    job_id: job.id().to_string(),
                    reason: e.to_string(),
                })?;
            let state = body.status().map(JobState::from_label);
            debug!(
                job_id = %job.id(),
                attempt = attempts,
                status = state.as_ref().map(JobState::label).unwrap_or("<absent>"),
                "Export job status"
            );
            job.observe(state.clone());

            match state {
                None | Some(JobState::Started) | Some(JobState::Finished) => {
                    info!(job_id = %job.id(), attempts, "Export job ready");
                    return Ok(attempts);
                }
                Some(JobState::Pending) => self.pause(job).await?,
                Some(other) => {
                    return Err(PollError::JobFailed {
                        job_id: job.id().to_string(),
                        status: other.label().to_string(),
                    }
                    .into());
                }
            }
        }
    }

    /// Fetch the result listing once
    pub async fn fetch_results(&self, job: &ExportJob) -> Result<ExportResults> {
        let url = self.client.results_url(self.scope, job.id())?;
        let response = self.client.api_request(Method::GET, url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(PollError::HttpStatus {
                job_id: job.id().to_string(),
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let malformed = |e: serde_json::Error| PollError::MalformedResponse {
            job_id: job.id().to_string(),
            reason: e.to_string(),
        };
        let raw: serde_json::Value = serde_json::from_str(&text).map_err(malformed)?;
        let body: ResultListingBody = serde_json::from_value(raw.clone()).map_err(malformed)?;
        let attributes = body.data.and_then(|d| d.attributes).unwrap_or_default();

        Ok(ExportResults {
            chunks: attributes.results,
            row_count: attributes.row_count,
            status: attributes
                .status
                .filter(|s| !s.is_empty())
                .map(|s| JobState::from_label(&s)),
            raw,
        })
    }

    /// Poll until ready, then fetch a usable result listing
    ///
    /// A listing with no results is only accepted once it reports `FINISHED`;
    /// otherwise it is fetched again after one interval.
    pub async fn wait_for_results(&mut self, job: &mut ExportJob) -> Result<ExportResults> {
        self.wait_until_ready(job).await?;
        loop {
            let results = self.fetch_results(job).await?;
            match results.status.clone() {
                Some(JobState::Error) => {
                    return Err(PollError::JobFailed {
                        job_id: job.id().to_string(),
                        status: JobState::Error.label().to_string(),
                    }
                    .into());
                }
                Some(JobState::Finished) => {
                    job.observe(Some(JobState::Finished));
                    return Ok(results);
                }
                _ if !results.chunks.is_empty() => return Ok(results),
                state => {
                    warn!(
                        job_id = %job.id(),
                        status = state.as_ref().map(JobState::label).unwrap_or("<absent>"),
                        "Result listing is empty and the job has not finished, checking again"
                    );
                    self.pause(job).await?;
                }
            }
        }
    }

    async fn pause(&mut self, job: &ExportJob) -> Result<()> {
        let interval = self.config.interval;
        if let Some(max_wait) = self.config.max_wait {
            if self.waited + interval > max_wait {
                return Err(PollError::TimedOut {
                    job_id: job.id().to_string(),
                    waited_secs: self.waited.as_secs(),
                }
                .into());
            }
        }
        self.sleeper.sleep(interval).await;
        self.waited += interval;
        Ok(())
    }
}
