//! From trait implementations for TetherError conversions

use super::types::TetherError;

impl From<anyhow::Error> for TetherError {
    fn from(error: anyhow::Error) -> Self {
        Self::other(error.to_string())
    }
}

impl From<std::io::Error> for TetherError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for TetherError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<regex::Error> for TetherError {
    fn from(error: regex::Error) -> Self {
        Self::config_with_context(error.to_string(), "compiling validation pattern")
    }
}

impl From<reqwest::Error> for TetherError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network {
            message: error.to_string(),
            url: error.url().map(|u| u.to_string()),
            status_code: error.status().map(|s| s.as_u16()),
        }
    }
}

impl From<crate::storage::StorageError> for TetherError {
    fn from(error: crate::storage::StorageError) -> Self {
        use crate::storage::StorageError;
        match error {
            StorageError::QuotaExceeded { ref key, .. } => {
                let key = key.clone();
                Self::storage_write(error.to_string(), key)
            }
            StorageError::Persist { ref key, .. } => {
                let key = key.clone();
                Self::storage_write(error.to_string(), key)
            }
            StorageError::Unavailable(message) => Self::StorageRead { message, key: None },
        }
    }
}

impl From<crate::storage::CodecError> for TetherError {
    fn from(error: crate::storage::CodecError) -> Self {
        Self::Codec {
            message: error.to_string(),
            key: None,
        }
    }
}

impl From<crate::request::TransportError> for TetherError {
    fn from(error: crate::request::TransportError) -> Self {
        Self::network(error.to_string())
    }
}
