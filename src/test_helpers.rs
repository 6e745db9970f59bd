//! Shared test helpers for HTTP-facing tests.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::Sleeper;
use crate::config::{ApiConfig, Config};
use crate::types::Scope;

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

pub(crate) const TOKEN: &str = "test-token";
pub(crate) const VERSION: &str = "2024-10-15";

pub(crate) fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        token: TOKEN.to_string(),
        ..ApiConfig::default()
    }
}

/// Valid group-scoped config pointed at a mock server.
pub(crate) fn test_config(base_url: &str, output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.api = api_config(base_url);
    config.export.scope = Scope::Group("grp-1".to_string());
    config.export.date_from = "2025-01-01".to_string();
    config.export.date_to = "2025-01-31".to_string();
    config.output.dir = output_dir.to_path_buf();
    config
}

pub(crate) fn created_body(id: &str) -> Value {
    json!({ "data": { "id": id, "type": "resource", "attributes": { "created": "2025-02-01T00:00:00Z" } } })
}

pub(crate) fn status_body(status: Option<&str>) -> Value {
    match status {
        Some(status) => json!({ "data": { "id": "job-1", "attributes": { "status": status } } }),
        None => json!({ "data": { "id": "job-1", "attributes": { "formats": ["csv"] } } }),
    }
}

/// Listing whose entries carry no per-chunk row count
pub(crate) fn listing_body(urls: &[String], status: &str) -> Value {
    let results: Vec<Value> = urls
        .iter()
        .map(|url| json!({ "url": url, "file_size": 100 }))
        .collect();
    json!({
        "data": {
            "id": "job-1",
            "attributes": {
                "results": results,
                "row_count": urls.len(),
                "status": status,
                "formats": ["csv"]
            }
        }
    })
}
