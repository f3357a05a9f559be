//! Configuration model

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::logging_config::LoggingConfig;
use super::timeouts;
use crate::error::{TetherError, TetherResult};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub api: ApiConfig,
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl TetherConfig {
    pub fn validate(&self) -> TetherResult<()> {
        if self.api.timeout_ms == 0 {
            return Err(TetherError::config_with_context(
                "Request timeout must be greater than zero",
                "api.timeout_ms",
            ));
        }
        if !self.api.base_url.is_empty()
            && !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(TetherError::config_with_context(
                format!("Base URL '{}' must start with http:// or https://", self.api.base_url),
                "api.base_url",
            ));
        }
        Ok(())
    }
}

/// Request client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Prefixed to every request URL
    pub base_url: String,
    /// Sent with every request, after the JSON content type
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: BTreeMap::new(),
            timeout_ms: timeouts::REQUEST_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Debounce and throttle delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub debounce_ms: u64,
    pub throttle_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: timeouts::DEBOUNCE_MS,
            throttle_ms: timeouts::THROTTLE_MS,
        }
    }
}

impl SchedulerConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Host store settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the store; in-memory when unset
    pub path: Option<PathBuf>,
    /// Maximum total size of keys and values in bytes
    pub quota_bytes: Option<usize>,
}
