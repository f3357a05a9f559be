//! Configuration
//!
//! [`TetherConfig`] gathers the tunables of every component: request client
//! defaults, scheduler delays, the host store location and quota, and
//! logging. Values come from defaults, then a TOML/YAML/JSON file, then
//! `TETHER_*` environment variables.

pub mod env_loader;
pub mod file_loader;
pub mod logging_config;
pub mod model;
pub mod timeouts;

use std::path::{Path, PathBuf};

pub use env_loader::{apply_env, load_from_env};
pub use file_loader::load_from_file;
pub use logging_config::{LogFormat, LoggingConfig};
pub use model::{ApiConfig, SchedulerConfig, StorageConfig, TetherConfig};

use crate::error::TetherResult;

/// `<config dir>/tether/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tether").join("config.toml"))
}

impl TetherConfig {
    /// File (explicit or the default location), then environment, then validation.
    pub fn load(path: Option<&Path>) -> TetherResult<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration file");
                load_from_file(&path)?
            }
            None => TetherConfig::default(),
        };
        apply_env(&mut config, |name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[scheduler]\nthrottle_ms = 1000\n").unwrap();

        let config = TetherConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.throttle_ms, 1000);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"api": {"timeout_ms": 0}}"#).unwrap();
        assert!(TetherConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_default_config_path_ends_with_tether() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("tether/config.toml"));
        }
    }
}
