//! Error types for vuln-export
//!
//! This module provides the error taxonomy for an export run:
//! - Fatal categories (validation, submission, polling) abort the whole run
//! - Recoverable categories (chunk download, chunk parse) are logged and skipped
//! - Machine-readable error codes for structured logs
//! - Exit code mapping for the binary

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vuln-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vuln-export
///
/// Each variant includes enough context (HTTP status, raw body, chunk index)
/// to diagnose a failed run from the log file alone.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input, detected before any network call
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description (one line per problem)
        message: String,
        /// The input that caused the error (e.g., "date_from")
        key: Option<String>,
    },

    /// Export job creation was rejected or answered with an unusable body
    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),

    /// Job status polling failed or the job reported an error state
    #[error("poll error: {0}")]
    Poll(#[from] PollError),

    /// A result chunk could not be fetched
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// A result chunk could not be parsed as tabular data
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The run was interrupted by a termination signal
    #[error("interrupted by signal")]
    Interrupted,
}

impl Error {
    /// Shorthand for a validation error without a specific key
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            key: None,
        }
    }
}

/// Export job creation errors
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The service answered with something other than 202 Accepted
    #[error("export creation failed with status {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the service
        status: u16,
        /// Raw response body for diagnostics
        body: String,
    },

    /// The service accepted the job but the body did not contain a job id
    #[error("malformed export response: {reason}")]
    MalformedResponse {
        /// What was missing or unreadable
        reason: String,
        /// Raw response body for diagnostics
        body: String,
    },
}

/// Job status polling errors
#[derive(Debug, Error)]
pub enum PollError {
    /// Non-200 answer from the status or result endpoint
    #[error("status check for job {job_id} failed with status {status}: {body}")]
    HttpStatus {
        /// The export job being polled
        job_id: String,
        /// HTTP status code returned by the service
        status: u16,
        /// Raw response body for diagnostics
        body: String,
    },

    /// The job reached the terminal error state upstream
    #[error("export job {job_id} reported status {status}")]
    JobFailed {
        /// The export job being polled
        job_id: String,
        /// Status label reported by the service
        status: String,
    },

    /// The response body could not be decoded
    #[error("unreadable status response for job {job_id}: {reason}")]
    MalformedResponse {
        /// The export job being polled
        job_id: String,
        /// Decoder message
        reason: String,
    },

    /// The configured maximum wait elapsed before the job became ready
    #[error("export job {job_id} not ready after {waited_secs}s")]
    TimedOut {
        /// The export job being polled
        job_id: String,
        /// Total time spent sleeping between polls
        waited_secs: u64,
    },
}

/// Result chunk download errors (recoverable)
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The chunk listing entry had no URL
    #[error("chunk {index} has no download URL")]
    MissingUrl {
        /// 1-based chunk index
        index: usize,
    },

    /// The signed URL answered with a non-success status
    #[error("chunk {index} download failed with status {status}")]
    HttpStatus {
        /// 1-based chunk index
        index: usize,
        /// HTTP status code
        status: u16,
    },

    /// Transport-level failure while fetching the chunk
    #[error("chunk {index} download failed: {reason}")]
    Transport {
        /// 1-based chunk index
        index: usize,
        /// Underlying error message
        reason: String,
    },

    /// The chunk was fetched but could not be saved
    #[error("chunk {index} could not be written to {path}: {reason}")]
    WriteFailed {
        /// 1-based chunk index
        index: usize,
        /// Destination file
        path: PathBuf,
        /// Underlying error message
        reason: String,
    },
}

impl DownloadError {
    /// The 1-based index of the chunk this error belongs to
    pub fn index(&self) -> usize {
        match self {
            DownloadError::MissingUrl { index }
            | DownloadError::HttpStatus { index, .. }
            | DownloadError::Transport { index, .. }
            | DownloadError::WriteFailed { index, .. } => *index,
        }
    }
}

/// Chunk parsing errors (recoverable at chunk granularity)
#[derive(Debug, Error)]
pub enum ParseError {
    /// The header row could not be read
    #[error("chunk {index}: unreadable header: {reason}")]
    Header {
        /// 1-based chunk index
        index: usize,
        /// Underlying error message
        reason: String,
    },

    /// A data row could not be read; remaining rows of the chunk are abandoned
    #[error("chunk {index}: malformed row near line {line}: {reason}")]
    Row {
        /// 1-based chunk index
        index: usize,
        /// Line number reported by the reader (0 when unknown)
        line: u64,
        /// Underlying error message
        reason: String,
    },

    /// The chunk held a different number of rows than its listing entry declared
    #[error("chunk {index}: listing declared {declared} rows but {parsed} were read")]
    RowCount {
        /// 1-based chunk index
        index: usize,
        /// Row count from the result listing
        declared: u64,
        /// Rows actually read
        parsed: u64,
    },
}

/// Classification of errors for logging and process exit
pub trait ErrorClass {
    /// Stable machine-readable error code
    fn error_code(&self) -> &str;

    /// Whether the error aborts the whole run
    fn is_fatal(&self) -> bool;

    /// Process exit code for a run that ended with this error
    fn exit_code(&self) -> u8;
}

impl ErrorClass for Error {
    fn error_code(&self) -> &str {
        match self {
            Error::Validation { .. } => "validation_error",
            Error::Submission(e) => match e {
                SubmissionError::Rejected { .. } => "submission_rejected",
                SubmissionError::MalformedResponse { .. } => "submission_malformed",
            },
            Error::Poll(e) => match e {
                PollError::HttpStatus { .. } => "poll_http_status",
                PollError::JobFailed { .. } => "job_failed",
                PollError::MalformedResponse { .. } => "poll_malformed",
                PollError::TimedOut { .. } => "poll_timed_out",
            },
            Error::Download(e) => match e {
                DownloadError::MissingUrl { .. } => "chunk_missing_url",
                DownloadError::HttpStatus { .. } => "chunk_http_status",
                DownloadError::Transport { .. } => "chunk_transport",
                DownloadError::WriteFailed { .. } => "chunk_write_failed",
            },
            Error::Parse(e) => match e {
                ParseError::Header { .. } => "chunk_bad_header",
                ParseError::Row { .. } => "chunk_bad_row",
                ParseError::RowCount { .. } => "chunk_row_count_mismatch",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Csv(_) => "csv_error",
            Error::Interrupted => "interrupted",
        }
    }

    fn is_fatal(&self) -> bool {
        !matches!(self, Error::Download(_) | Error::Parse(_))
    }

    fn exit_code(&self) -> u8 {
        match self {
            Error::Validation { .. } => 2,
            Error::Interrupted => 130,
            _ => 1,
        }
    }
}
