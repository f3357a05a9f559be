//! UnifiedError trait implementation for TetherError

use super::types::{TetherError, UnifiedError};

impl UnifiedError for TetherError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "TETHER_CONFIG",
            Self::Validation { .. } => "TETHER_VALIDATION",
            Self::UnknownField { .. } => "TETHER_UNKNOWN_FIELD",
            Self::Codec { .. } => "TETHER_CODEC",
            Self::StorageRead { .. } => "TETHER_STORAGE_READ",
            Self::StorageWrite { .. } => "TETHER_STORAGE_WRITE",
            Self::Network { .. } => "TETHER_NETWORK",
            Self::Timeout { .. } => "TETHER_TIMEOUT",
            Self::Cancelled => "TETHER_CANCELLED",
            Self::SubmitHandler { .. } => "TETHER_SUBMIT_HANDLER",
            Self::Runtime { .. } => "TETHER_RUNTIME",
            Self::Io { .. } => "TETHER_IO",
            Self::Json { .. } => "TETHER_JSON",
            Self::Other { .. } => "TETHER_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } => message,
            Self::Validation { message, .. } => message,
            Self::UnknownField { name } => name,
            Self::Codec { message, .. } => message,
            Self::StorageRead { message, .. } => message,
            Self::StorageWrite { message, .. } => message,
            Self::Network { message, .. } => message,
            Self::Timeout { .. } => "Request timed out",
            Self::Cancelled => "Operation was cancelled",
            Self::SubmitHandler { message } => message,
            Self::Runtime { message } => message,
            Self::Io { message, .. } => message,
            Self::Json { message } => message,
            Self::Other { message } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::Validation { field, .. } => Some(field),
            Self::Codec { key, .. } | Self::StorageRead { key, .. } | Self::StorageWrite { key, .. } => {
                key.as_deref()
            }
            Self::Network { url, .. } => url.as_deref(),
            Self::Io { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Network { status_code, .. } => {
                status_code.map_or(true, |code| code >= 500 || code == 429)
            }
            _ => false,
        }
    }
}
