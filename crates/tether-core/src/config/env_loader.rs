//! Environment variable-based configuration loading

use std::path::PathBuf;
use std::str::FromStr;

use super::model::TetherConfig;
use crate::error::{TetherError, TetherResult};

pub const ENV_API_BASE_URL: &str = "TETHER_API_BASE_URL";
pub const ENV_API_TIMEOUT_MS: &str = "TETHER_API_TIMEOUT_MS";
pub const ENV_DEBOUNCE_MS: &str = "TETHER_DEBOUNCE_MS";
pub const ENV_THROTTLE_MS: &str = "TETHER_THROTTLE_MS";
pub const ENV_STORAGE_PATH: &str = "TETHER_STORAGE_PATH";
pub const ENV_STORAGE_QUOTA_BYTES: &str = "TETHER_STORAGE_QUOTA_BYTES";
pub const ENV_LOG_LEVEL: &str = "TETHER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TETHER_LOG_FORMAT";

/// Defaults overlaid with the process environment.
pub fn load_from_env() -> TetherResult<TetherConfig> {
    let mut config = TetherConfig::default();
    apply_env(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Overlay every `TETHER_*` variable `lookup` returns onto `config`.
pub fn apply_env(config: &mut TetherConfig, lookup: impl Fn(&str) -> Option<String>) -> TetherResult<()> {
    if let Some(base_url) = lookup(ENV_API_BASE_URL) {
        config.api.base_url = base_url;
    }
    if let Some(value) = lookup(ENV_API_TIMEOUT_MS) {
        config.api.timeout_ms = parse(ENV_API_TIMEOUT_MS, &value)?;
    }
    if let Some(value) = lookup(ENV_DEBOUNCE_MS) {
        config.scheduler.debounce_ms = parse(ENV_DEBOUNCE_MS, &value)?;
    }
    if let Some(value) = lookup(ENV_THROTTLE_MS) {
        config.scheduler.throttle_ms = parse(ENV_THROTTLE_MS, &value)?;
    }
    if let Some(path) = lookup(ENV_STORAGE_PATH) {
        config.storage.path = (!path.is_empty()).then(|| PathBuf::from(path));
    }
    if let Some(value) = lookup(ENV_STORAGE_QUOTA_BYTES) {
        config.storage.quota_bytes = Some(parse(ENV_STORAGE_QUOTA_BYTES, &value)?);
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(value) = lookup(ENV_LOG_FORMAT) {
        config.logging.format = parse(ENV_LOG_FORMAT, &value)?;
    }
    Ok(())
}

fn parse<T: FromStr>(name: &str, value: &str) -> TetherResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TetherError::config(format!("Invalid {} value: '{}'", name, value)))
}
