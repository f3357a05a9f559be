//! Core error types and traits for Tether

use thiserror::Error;

/// Result type alias for Tether operations
pub type TetherResult<T> = Result<T, TetherError>;

/// Unified error trait implemented by every Tether error.
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
/// - is_retryable(): Whether repeating the operation may succeed
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Main error type for Tether
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TetherError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// A field failed one of its validation rules
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// A field name that the form schema does not declare
    #[error("Unknown field: {name}")]
    UnknownField { name: String },

    /// Stored value could not be encoded or decoded
    #[error("Codec error: {message}")]
    Codec {
        message: String,
        key: Option<String>,
    },

    /// Host store could not be read
    #[error("Storage read error: {message}")]
    StorageRead {
        message: String,
        key: Option<String>,
    },

    /// Host store rejected a write (quota, permissions, persistence)
    #[error("Storage write error: {message}")]
    StorageWrite {
        message: String,
        key: Option<String>,
    },

    /// Transport-level failure or an unsuccessful HTTP status
    #[error("Network error: {message}")]
    Network {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
    },

    /// Bounded wait elapsed before the operation completed
    #[error("Request timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Operation was cancelled before it completed
    #[error("Operation was cancelled")]
    Cancelled,

    /// User-supplied submit handler failed or panicked
    #[error("Submit handler error: {message}")]
    SubmitHandler { message: String },

    /// No async runtime available to drive timers
    #[error("Runtime error: {message}")]
    Runtime { message: String },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Generic error with context
    #[error("Error: {message}")]
    Other { message: String },
}
