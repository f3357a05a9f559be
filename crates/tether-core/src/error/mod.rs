//! Error types for Tether
//!
//! Every failure this crate can produce is expressed as a [`TetherError`].
//! Recoverable failures (validation, storage codec/write problems, network
//! and timeout failures, submit handler errors) are normally converted into
//! typed results or component-local state before they reach the caller; the
//! enum is what those states carry.
//!
//! All variants implement [`UnifiedError`], which provides:
//! - error_code: A stable identifier for programmatic handling
//! - message: Human-readable error message
//! - context: Optional additional context about where/why the error occurred

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{TetherError, TetherResult, UnifiedError};
