//! Configuration types for vuln-export

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};
use crate::types::{DEFAULT_COLUMNS, DateRange, ExportRequest, ReportMode, Scope, parse_date};

/// Environment variable holding the API credential
pub const TOKEN_ENV_VAR: &str = "SNYK_TOKEN";

/// Remote API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL (default: "https://api.snyk.io")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// REST API version query parameter (default: "2024-10-15")
    #[serde(default = "default_api_version")]
    pub version: String,

    /// API credential, sent as `Authorization: token <value>`
    #[serde(default, skip_serializing)]
    pub token: String,

    /// Timeout for each API request (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for each chunk download (default: 300 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_api_version(),
            token: String::new(),
            request_timeout: default_request_timeout(),
            download_timeout: default_download_timeout(),
        }
    }
}

/// What to export
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Group or organization the export is restricted to
    #[serde(default)]
    pub scope: Scope,

    /// First calendar day, `YYYY-MM-DD`
    #[serde(default)]
    pub date_from: String,

    /// Last calendar day, `YYYY-MM-DD`
    #[serde(default)]
    pub date_to: String,

    /// Columns requested from the export API
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Lifetime of the signed result URLs (default: 3600 seconds)
    #[serde(default = "default_url_expiration", with = "duration_serde")]
    pub url_expiration: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scope: Scope::default(),
            date_from: String::new(),
            date_to: String::new(),
            columns: default_columns(),
            url_expiration: default_url_expiration(),
        }
    }
}

/// Job status polling
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status queries (default: 1 second)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Give up after sleeping this long in total (default: None = wait forever)
    #[serde(default, with = "optional_duration_serde")]
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_wait: None,
        }
    }
}

/// Where and what to write
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output folder (default: "./results")
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Empty the output folder before the run (default: true)
    #[serde(default = "default_true")]
    pub clear_before_run: bool,

    /// Report mode (default: derived from the scope kind)
    #[serde(default)]
    pub mode: Option<ReportMode>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            clear_before_run: true,
            mode: None,
        }
    }
}

/// Main configuration for an export run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// What to export
    #[serde(default)]
    pub export: ExportConfig,

    /// Job status polling
    #[serde(default)]
    pub poll: PollConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Read the credential from the environment into `api.token`
    pub fn with_token_from_env(mut self) -> Self {
        self.api.token = std::env::var(TOKEN_ENV_VAR).unwrap_or_default();
        self
    }

    /// Check every required input, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.api.token.trim().is_empty() {
            problems.push(format!("{TOKEN_ENV_VAR} environment variable is not set"));
        }
        if self.export.scope.id().trim().is_empty() {
            problems.push(match self.export.scope {
                Scope::Group(_) => "--group-id is required".to_string(),
                Scope::Org(_) => "--org-id is required".to_string(),
            });
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            problems.push(format!("--api-url is not a valid URL: {}", self.api.base_url));
        }
        if self.poll.interval.is_zero() {
            problems.push("--poll-interval must be at least 1 second".to_string());
        }

        let from = required_date("date_from", &self.export.date_from, &mut problems);
        let to = required_date("date_to", &self.export.date_to, &mut problems);
        if let (Some(from), Some(to)) = (from, to) {
            if let Err(e) = DateRange::new(from, to) {
                problems.push(validation_message(e));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                message: problems.join("\n"),
                key: None,
            })
        }
    }

    /// Validated date range
    pub fn date_range(&self) -> Result<DateRange> {
        DateRange::parse(&self.export.date_from, &self.export.date_to)
    }

    /// Build the export request for this run
    pub fn export_request(&self) -> Result<ExportRequest> {
        let mut request = ExportRequest::new(self.export.scope.clone(), self.date_range()?);
        request.columns = self.export.columns.clone();
        request.url_expiration_secs = self.export.url_expiration.as_secs();
        Ok(request)
    }

    /// Effective report mode
    pub fn report_mode(&self) -> ReportMode {
        self.output
            .mode
            .unwrap_or_else(|| self.export.scope.default_mode())
    }
}

fn required_date(
    key: &str,
    value: &str,
    problems: &mut Vec<String>,
) -> Option<chrono::NaiveDate> {
    if value.is_empty() {
        problems.push(format!("--{} is required", key.replace('_', "-")));
        return None;
    }
    match parse_date(key, value) {
        Ok(date) => Some(date),
        Err(e) => {
            problems.push(validation_message(e));
            None
        }
    }
}

fn validation_message(error: Error) -> String {
    match error {
        Error::Validation { message, .. } => message,
        other => other.to_string(),
    }
}

fn default_base_url() -> String {
    "https://api.snyk.io".to_string()
}

fn default_api_version() -> String {
    "2024-10-15".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_url_expiration() -> Duration {
    Duration::from_secs(3600)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
