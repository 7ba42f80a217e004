//! Configuration types for the service history viewer

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

use crate::StatusCode;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Full URL of the `service-history.json` endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Listening address of the page server
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub log_search: LogSearchConfig,
    #[serde(default)]
    pub status_classes: StatusClasses,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            address: default_address(),
            request_timeout_seconds: default_request_timeout(),
            page: PageConfig::default(),
            log_search: LogSearchConfig::default(),
            status_classes: StatusClasses::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Initial contents of the page inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub min_tick: i64,
    #[serde(default = "default_max_tick")]
    pub max_tick: i64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            min_tick: 0,
            max_tick: default_max_tick(),
        }
    }
}

/// Settings for deep links into the log search tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSearchConfig {
    /// Relative search window in seconds; 0 searches all messages
    #[serde(default)]
    pub relative_seconds: u64,
}

/// Status code to CSS class mapping used to color table cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusClasses(BTreeMap<StatusCode, String>);

impl StatusClasses {
    pub fn get(&self, code: StatusCode) -> Option<&str> {
        self.0.get(&code).map(String::as_str)
    }
}

impl Default for StatusClasses {
    fn default() -> Self {
        [
            (0, "success"),
            (1, "danger"),
            (2, "warning"),
            (3, "info"),
            (4, "active"),
        ]
        .into_iter()
        .map(|(code, class)| (StatusCode(code), class.to_string()))
        .collect()
    }
}

impl FromIterator<(StatusCode, String)> for StatusClasses {
    fn from_iter<I: IntoIterator<Item = (StatusCode, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000/competition/service-history.json".to_string()
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_tick() -> i64 {
    30
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::ViewerError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
