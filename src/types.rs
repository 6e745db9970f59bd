//! Core types for vuln-export

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Wire format of the `introduced` filter bounds
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Calendar date format accepted on input
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns requested from the export API
pub const DEFAULT_COLUMNS: [&str; 16] = [
    "GROUP_PUBLIC_ID",
    "GROUP_SLUG",
    "ORG_PUBLIC_ID",
    "ORG_DISPLAY_NAME",
    "ISSUE_SEVERITY_RANK",
    "ISSUE_SEVERITY",
    "SCORE",
    "PROBLEM_TITLE",
    "CVE",
    "CWE",
    "PROJECT_NAME",
    "PROJECT_URL",
    "FIRST_INTRODUCED",
    "PRODUCT_NAME",
    "ISSUE_URL",
    "ISSUE_STATUS",
];

/// Identifier of a server-side export job
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportJobId(pub String);

impl ExportJobId {
    /// Create a new ExportJobId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExportJobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ExportJobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the export is restricted to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Scope {
    /// A group and every organization in it
    Group(String),
    /// A single organization
    Org(String),
}

impl Scope {
    /// The scope identifier
    pub fn id(&self) -> &str {
        match self {
            Scope::Group(id) | Scope::Org(id) => id,
        }
    }

    /// REST collection segment for this scope kind
    pub fn collection(&self) -> &'static str {
        match self {
            Scope::Group(_) => "groups",
            Scope::Org(_) => "orgs",
        }
    }

    /// Report mode used when none is requested explicitly
    pub fn default_mode(&self) -> ReportMode {
        match self {
            Scope::Group(_) => ReportMode::Organizations,
            Scope::Org(_) => ReportMode::SingleScope,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Group(String::new())
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Group(id) => write!(f, "group {id}"),
            Scope::Org(id) => write!(f, "org {id}"),
        }
    }
}

/// Which artifacts the report stage produces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    /// Per-status tables broken down by organization
    #[default]
    Organizations,
    /// One severity summary for the whole scope
    SingleScope,
}

impl std::str::FromStr for ReportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "organizations" | "orgs" => Ok(ReportMode::Organizations),
            "single-scope" | "single" => Ok(ReportMode::SingleScope),
            other => Err(Error::Validation {
                message: format!("unknown report mode: {other}"),
                key: Some("mode".to_string()),
            }),
        }
    }
}

/// Inclusive calendar-day range for the `introduced` filter
///
/// Construction guarantees `from <= to`. The bounds are widened to full days:
/// `from` at 00:00:00Z and `to` at 23:59:59Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `from` after `to`
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::Validation {
                message: format!("date-from ({from}) must be before or equal to date-to ({to})"),
                key: Some("date_from".to_string()),
            });
        }
        Ok(Self { from, to })
    }

    /// Parse both bounds from `YYYY-MM-DD` strings
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Self::new(parse_date("date_from", from)?, parse_date("date_to", to)?)
    }

    /// First calendar day
    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    /// Last calendar day
    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    /// Start of the first day, UTC
    pub fn start(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.from.and_time(NaiveTime::MIN))
    }

    /// Last second of the last day, UTC
    pub fn end(&self) -> DateTime<Utc> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Utc.from_utc_datetime(&self.to.and_time(end_of_day))
    }

    /// `start()` in wire format
    pub fn start_param(&self) -> String {
        self.start().format(INSTANT_FORMAT).to_string()
    }

    /// `end()` in wire format
    pub fn end_param(&self) -> String {
        self.end().format(INSTANT_FORMAT).to_string()
    }
}

// ASCII digits only
#[allow(clippy::expect_used)]
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("literal pattern is valid"));

/// Parse a strict `YYYY-MM-DD` date, naming the offending input on failure
pub fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    if !DATE_SHAPE.is_match(value) {
        return Err(Error::Validation {
            message: format!("{key} must be in YYYY-MM-DD format, got: {value}"),
            key: Some(key.to_string()),
        });
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::Validation {
        message: format!("{key} is not a valid date: {value}"),
        key: Some(key.to_string()),
    })
}

/// One export run's request parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRequest {
    /// Group or organization the export is restricted to
    pub scope: Scope,
    /// `introduced` filter
    pub range: DateRange,
    /// Requested columns
    pub columns: Vec<String>,
    /// Dataset name (always "issues" for this tool)
    pub dataset: String,
    /// Output formats
    pub formats: Vec<String>,
    /// Lifetime of the signed result URLs
    pub url_expiration_secs: u64,
}

impl ExportRequest {
    /// Request with the default column set, `issues` dataset and CSV output
    pub fn new(scope: Scope, range: DateRange) -> Self {
        Self {
            scope,
            range,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            dataset: "issues".to_string(),
            formats: vec!["csv".to_string()],
            url_expiration_secs: 3600,
        }
    }
}

/// Job lifecycle state as reported by the status endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    /// Queued, not started
    Pending,
    /// Running; results may already be listed
    Started,
    /// Terminal success
    Finished,
    /// Terminal failure
    Error,
    /// Any label this tool does not know
    Unknown(String),
}

impl JobState {
    /// Map an upstream status label
    pub fn from_label(label: &str) -> Self {
        match label {
            "PENDING" => JobState::Pending,
            "STARTED" => JobState::Started,
            "FINISHED" => JobState::Finished,
            "ERROR" | "ERRORED" => JobState::Error,
            other => JobState::Unknown(other.to_string()),
        }
    }

    /// Upstream label
    pub fn label(&self) -> &str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Started => "STARTED",
            JobState::Finished => "FINISHED",
            JobState::Error => "ERROR",
            JobState::Unknown(label) => label,
        }
    }

    /// Whether no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Error)
    }
}

/// An export job tracked by the client
///
/// `state` is `None` until the first status response, and also when a
/// response omits the status field. Once terminal, the state never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportJob {
    id: ExportJobId,
    state: Option<JobState>,
}

impl ExportJob {
    /// A freshly submitted job
    pub fn new(id: ExportJobId) -> Self {
        Self { id, state: None }
    }

    /// Job id
    pub fn id(&self) -> &ExportJobId {
        &self.id
    }

    /// Last observed state
    pub fn state(&self) -> Option<&JobState> {
        self.state.as_ref()
    }

    /// Record an observed state; ignored once the job is terminal
    pub(crate) fn observe(&mut self, state: Option<JobState>) {
        if self.state.as_ref().is_some_and(JobState::is_terminal) {
            return;
        }
        self.state = state;
    }
}

/// One downloadable result file of a finished job
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultChunk {
    /// Time-limited signed URL
    #[serde(default)]
    pub url: Option<String>,
    /// Declared size in bytes
    #[serde(default)]
    pub file_size: u64,
    /// Declared number of data rows, when the listing gives one
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// Issue severity
///
/// Exactly four literals are recognized, case-sensitively. Everything else is
/// kept verbatim in `Unrecognized` and never counted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// "Critical"
    Critical,
    /// "High"
    High,
    /// "Medium"
    Medium,
    /// "Low"
    Low,
    /// Any other value, including empty and differently-cased literals
    Unrecognized(String),
}

impl Severity {
    /// Classify a raw severity value
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Critical" => Severity::Critical,
            "High" => Severity::High,
            "Medium" => Severity::Medium,
            "Low" => Severity::Low,
            other => Severity::Unrecognized(other.to_string()),
        }
    }

    /// The raw value this severity was parsed from
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Unrecognized(raw) => raw,
        }
    }

    /// Whether this is one of the four counted levels
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Severity::Unrecognized(_))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress event emitted while a run is in flight
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// The export job was accepted
    JobSubmitted {
        /// Job id assigned by the service
        job_id: ExportJobId,
    },

    /// The job is ready and its result listing was fetched
    ResultsReady {
        /// Job id
        job_id: ExportJobId,
        /// Declared total row count
        total_rows: u64,
        /// Number of result chunks listed
        chunks: usize,
    },

    /// The result listing was saved
    ResultSaved {
        /// Where it was written
        path: std::path::PathBuf,
    },

    /// A chunk was downloaded and parsed completely
    ChunkProcessed {
        /// 1-based chunk index
        index: usize,
        /// Records read from the chunk
        records: u64,
    },

    /// A chunk could not be downloaded or parsed completely
    ChunkFailed {
        /// 1-based chunk index
        index: usize,
        /// What went wrong
        reason: String,
    },

    /// Every listed chunk has been attempted
    DownloadsFinished {
        /// Chunks listed
        requested: usize,
        /// Chunks fetched
        downloaded: usize,
        /// Chunks parsed without error
        parsed: usize,
    },

    /// Report artifacts were written
    ReportWritten {
        /// Number of distinct status groups
        statuses: usize,
        /// Files written for the report
        files: usize,
    },
}
