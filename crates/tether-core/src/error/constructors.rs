//! Constructor methods for TetherError

use super::types::TetherError;

impl TetherError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Create a codec error for a storage key
    pub fn codec(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a storage read error for a key
    pub fn storage_read(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::StorageRead {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a storage write error for a key
    pub fn storage_write(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::StorageWrite {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: None,
            status_code: None,
        }
    }

    /// Create a network error carrying the response status
    pub fn http_status(status_code: u16, message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: None,
            status_code: Some(status_code),
        }
    }

    /// Create a timeout error
    pub fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }

    /// Create a submit handler error
    pub fn submit_handler(message: impl Into<String>) -> Self {
        Self::SubmitHandler {
            message: message.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
