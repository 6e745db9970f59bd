//! Test configuration helpers

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use vuln_export::{Config, Scope, Sleeper};

/// Group-scoped configuration pointed at `base_url`
pub fn mock_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.token = "integration-token".to_string();
    config.export.scope = Scope::Group("grp-1".to_string());
    config.export.date_from = "2025-01-01".to_string();
    config.export.date_to = "2025-01-31".to_string();
    config.output.dir = output.to_path_buf();
    config
}

/// Sleeper that counts requested delays without waiting
#[derive(Debug, Default)]
pub struct CountingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl CountingSleeper {
    /// Delays requested so far
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

/// Whether live API credentials are available
///
/// Required environment variables:
/// - `SNYK_TOKEN` - API token
/// - `SNYK_GROUP_ID` - group to export
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("SNYK_TOKEN").is_ok() && std::env::var("SNYK_GROUP_ID").is_ok()
}
