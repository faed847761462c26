use super::TraversalConfig;

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    entries: Option<Vec<EntryConfig>>,
    traversal: Option<TraversalConfig>,
}

/// A table to watch from boot, and the webhook its records are forwarded to.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EntryConfig {
    pub table_name: String,
    pub url: String,
}

impl ConfigFile {
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Self {
        path.map(read_config).unwrap_or_default()
    }

    pub fn entries(&self) -> Vec<EntryConfig> {
        self.entries.clone().unwrap_or_default()
    }

    pub fn traversal(&self) -> TraversalConfig {
        self.traversal.clone().unwrap_or_default()
    }
}

fn read_config<P: AsRef<Path>>(path: P) -> ConfigFile {
    _read_config(path).unwrap_or_else(|err| {
        warn!("{err}");
        warn!("Skip reading config file.");
        ConfigFile::default()
    })
}

fn _read_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile, String> {
    let content = fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read: {}. {err}", path.as_ref().to_string_lossy()))?;
    serde_yaml::from_str(&content)
        .map_err(|err| format!("Failed to deserialize config file: {err}"))
}
