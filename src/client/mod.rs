//! HTTP access to the export API
//!
//! [`ExportClient`] owns the `reqwest::Client`, the base URL, API version and
//! credential. The three pipeline stages that talk to the network borrow it:
//! - [`JobSubmitter`] creates the export job
//! - [`JobStatusPoller`] waits for the job and fetches its result listing
//! - [`ResultDownloader`] fetches the signed result files

mod download;
mod poll;
mod submit;
mod wire;

#[cfg(test)]
mod tests;

pub use download::{DownloadedChunk, ResultDownloader};
pub use poll::{ExportResults, JobStatusPoller, Sleeper, TokioSleeper};
pub use submit::JobSubmitter;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{ExportJobId, Scope};

/// Shared HTTP client for one export run
#[derive(Clone, Debug)]
pub struct ExportClient {
    http: reqwest::Client,
    base_url: Url,
    version: String,
    token: String,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl ExportClient {
    /// Build a client from the API settings
    ///
    /// # Errors
    /// Returns a validation error for an unusable base URL, or a network
    /// error if the HTTP client cannot be created.
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url).map_err(|e| Error::Validation {
            message: format!("invalid API URL {}: {}", api.base_url, e),
            key: Some("api_url".to_string()),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Validation {
                message: format!("API URL cannot be used as a base: {}", api.base_url),
                key: Some("api_url".to_string()),
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("vuln-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            version: api.version.clone(),
            token: api.token.clone(),
            request_timeout: api.request_timeout,
            download_timeout: api.download_timeout,
        })
    }

    /// `POST /rest/{groups|orgs}/{id}/export`
    pub fn export_url(&self, scope: &Scope) -> Result<Url> {
        self.endpoint(scope, &["export"])
    }

    /// `GET /rest/{groups|orgs}/{id}/jobs/export/{job}`
    pub fn status_url(&self, scope: &Scope, job: &ExportJobId) -> Result<Url> {
        self.endpoint(scope, &["jobs", "export", job.as_str()])
    }

    /// `GET /rest/{groups|orgs}/{id}/export/{job}`
    pub fn results_url(&self, scope: &Scope, job: &ExportJobId) -> Result<Url> {
        self.endpoint(scope, &["export", job.as_str()])
    }

    fn endpoint(&self, scope: &Scope, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| Error::Validation {
                message: format!("API URL cannot be used as a base: {}", self.base_url),
                key: Some("api_url".to_string()),
            })?;
            segments
                .pop_if_empty()
                .extend(["rest", scope.collection(), scope.id()])
                .extend(tail);
        }
        url.query_pairs_mut().append_pair("version", &self.version);
        Ok(url)
    }

    /// Authenticated API request
    pub(crate) fn api_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.request_timeout)
    }

    /// Plain GET against a signed result URL (no credential)
    pub(crate) fn download_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.get(url).timeout(self.download_timeout)
    }
}
