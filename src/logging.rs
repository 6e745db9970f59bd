//! Log setup for the binary
//!
//! Two layers: a dated log file in the output folder that records everything
//! at debug level, and stderr filtered by `RUST_LOG` (warn by default, debug
//! when verbose).

use chrono::NaiveDate;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::error::{Error, Result};
use crate::utils::compact_date_stamp;

/// `<dir>/<YYYYMMDD>.log`
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.log", compact_date_stamp(date)))
}

/// Filter for the stderr layer
pub fn stderr_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, returning the log file path
///
/// `dir` must exist. Call once, after the output folder has been prepared.
pub fn init(dir: &Path, date: NaiveDate, verbose: bool) -> Result<PathBuf> {
    let path = log_file_path(dir, date);
    let file = File::options().create(true).append(true).open(&path)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::DEBUG);
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    Ok(path)
}
