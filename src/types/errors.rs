//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the tool invocation core.
///
/// Per-call failures (catalog misses, HTTP errors, timeouts) are captured
/// into the call's `ToolResult` and never escape the dispatch entry points;
/// this enum is what the internal steps hand around before that capture.
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog lookup miss (endpoint or system absent).
    #[error("not found: {0}")]
    NotFound(String),

    /// A credential is required but the store returned nothing.
    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    /// HTTP request exceeded the endpoint's configured timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Transport-level HTTP failure (connect, TLS, protocol).
    #[error("network error: {0}")]
    Network(String),

    /// Dispatch stopped by the caller's cancellation token.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

// Convenience constructors
impl Error {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn credential_not_found(msg: impl Into<String>) -> Self {
        Self::CredentialNotFound(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout("Request timed out".to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
