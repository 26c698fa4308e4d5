//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the loopback kernel connection.
///
/// The transport itself never fails (there is no real network), so there is
/// no transport-level variant: a `send` only errors when the inbound message
/// cannot be parsed, and lifecycle handling only errors when the execution
/// engine is gone.
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound protocol message could not be parsed.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The execution engine stopped accepting dispatch signals.
    #[error("engine dispatch failed: {0}")]
    Dispatch(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

// Convenience constructors
impl Error {
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
