//! Utility functions for the output folder and artifact names

use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::Result;

/// File name used when a status label sanitizes to nothing
pub const UNKNOWN_NAME: &str = "Unknown";

#[allow(clippy::expect_used)]
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("literal pattern is valid"));

/// Make an issue-status label usable inside a file name
///
/// Characters that are reserved on common filesystems (`<>:"/\|?*`) become
/// `_`, surrounding whitespace is trimmed, and an empty result falls back to
/// [`UNKNOWN_NAME`].
///
/// # Examples
///
/// ```
/// use vuln_export::utils::safe_status_filename;
///
/// assert_eq!(safe_status_filename("Open"), "Open");
/// assert_eq!(safe_status_filename("Won't fix / later"), "Won't fix _ later");
/// assert_eq!(safe_status_filename("   "), "Unknown");
/// ```
#[must_use]
pub fn safe_status_filename(status: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(status, "_");
    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `YYYYMMDD`, used for the run log file name
#[must_use]
pub fn compact_date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `YYYY-MM-DD`, used for the single-scope report
#[must_use]
pub fn date_stamp(date: NaiveDate) -> String {
    date.format(crate::types::DATE_FORMAT).to_string()
}

/// Today's date in UTC
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Create `dir` if needed and remove everything inside it
///
/// Entries that cannot be removed are logged and left in place; only a
/// failure to create or list the directory itself is an error.
///
/// Returns the number of entries removed.
pub async fn clear_output_dir(dir: &Path) -> Result<usize> {
    tokio::fs::create_dir_all(dir).await?;

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let outcome = match entry.file_type().await {
            Ok(kind) if kind.is_dir() => tokio::fs::remove_dir_all(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                debug!(path = %path.display(), "Removed from output folder");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete from output folder");
            }
        }
    }
    Ok(removed)
}
