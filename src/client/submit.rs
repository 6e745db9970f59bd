//! Export job creation

use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use super::ExportClient;
use super::wire::{CreateExportBody, ExportCreated};
use crate::error::{Result, SubmissionError};
use crate::types::{ExportJob, ExportJobId, ExportRequest};

/// Issues the export request and extracts the job id
#[derive(Debug)]
pub struct JobSubmitter<'a> {
    client: &'a ExportClient,
}

impl<'a> JobSubmitter<'a> {
    /// Submitter using `client`
    pub fn new(client: &'a ExportClient) -> Self {
        Self { client }
    }

    /// Create the export job
    ///
    /// The request's date range is already normalized to full UTC days.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::Rejected`] for any status other than 202 Accepted
    /// - [`SubmissionError::MalformedResponse`] when an accepted response has no job id
    /// - a network error if the request could not be sent
    pub async fn submit(&self, request: &ExportRequest) -> Result<ExportJob> {
        let url = self.client.export_url(&request.scope)?;
        let body = CreateExportBody::from_request(request);

        info!(scope = %request.scope, "Starting export job");
        debug!(
            url = %url,
            from = %request.range.start_param(),
            to = %request.range.end_param(),
            "Export request"
        );

        let response = self
            .client
            .api_request(Method::POST, url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::ACCEPTED {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let created: ExportCreated =
            serde_json::from_str(&text).map_err(|e| SubmissionError::MalformedResponse {
                reason: e.to_string(),
                body: text.clone(),
            })?;

        let id = created
            .data
            .and_then(|d| d.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SubmissionError::MalformedResponse {
                reason: "no export id in response".to_string(),
                body: text.clone(),
            })?;

        info!(job_id = %id, "Export job started");
        Ok(ExportJob::new(ExportJobId::new(id)))
    }
}
