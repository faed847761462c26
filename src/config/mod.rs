use crate::{ENV_CONFIG_PATH, ENV_DYNAMODB_ENDPOINT_URL, ENV_PORT};
use crate::retry::Backoff;
use crate::types::ShardIteratorType;

use serde::Deserialize;
use std::env;
use tokio::time::Duration;

mod file;

use file::ConfigFile;
pub use file::EntryConfig;

#[derive(Debug)]
pub struct Config {
    endpoint_url: Option<String>,
    port: u16,
    entries: Vec<EntryConfig>,
    traversal: TraversalConfig,
}

impl Config {
    pub fn new() -> Self {
        let endpoint_url = env::var(ENV_DYNAMODB_ENDPOINT_URL).ok();
        let port = env::var(ENV_PORT)
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let conf_path = env::var(ENV_CONFIG_PATH).ok();
        let file = ConfigFile::new(conf_path);

        Self {
            endpoint_url,
            port,
            entries: file.entries(),
            traversal: file.traversal(),
        }
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint_url.clone()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn entries(&self) -> Vec<EntryConfig> {
        self.entries.clone()
    }

    pub fn traversal(&self) -> TraversalConfig {
        self.traversal.clone()
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// Tuning knobs of a traversal. Every key is optional in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Where shards present in the first snapshot start. Shards discovered later always start at
    /// the trim horizon so that no record of a child is skipped.
    pub initial_position: ShardIteratorType,
    /// Maximum records per `GetRecords`. The service caps it at 1000.
    pub page_limit: Option<i32>,
    /// Sleep between rounds that returned no records.
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Upper bound on the age of a topology snapshot.
    pub refresh_interval_secs: u64,
    pub iterator_ttl_secs: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            initial_position: ShardIteratorType::TrimHorizon,
            page_limit: None,
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
            refresh_interval_secs: 60,
            iterator_ttl_secs: 15 * 60,
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
        }
    }
}

impl TraversalConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn iterator_ttl(&self) -> Duration {
        Duration::from_secs(self.iterator_ttl_secs)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.max_attempts,
        )
    }
}
