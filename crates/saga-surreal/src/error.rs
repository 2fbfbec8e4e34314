//! Error types for the SurrealDB idempotency store.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while setting up or querying the store.
///
/// Only [`SurrealIdempotencyStore::connect`](crate::SurrealIdempotencyStore::connect)
/// surfaces these to callers; the store operations themselves fail open.
#[derive(Debug, Error)]
pub enum SurrealStoreError {
    /// The database could not be reached.
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },

    /// Root sign-in was rejected.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// A query or record operation failed.
    #[error("query failed: {reason}")]
    QueryFailed { reason: String },

    /// The operation did not finish in time.
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl SurrealStoreError {
    /// Create a connection failed error.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            reason: reason.into(),
        }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    /// Create a query failed error.
    pub fn query_failed(reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout {
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Result type for store setup.
pub type SurrealStoreResult<T> = Result<T, SurrealStoreError>;

/// Classify a SurrealDB error by its message.
pub fn from_surrealdb_error(err: impl fmt::Display) -> SurrealStoreError {
    let msg = err.to_string();

    if msg.contains("connection") || msg.contains("Connection") || msg.contains("connect") {
        SurrealStoreError::connection_failed(msg)
    } else if msg.contains("authentication") || msg.contains("credentials") {
        SurrealStoreError::authentication_failed(msg)
    } else {
        SurrealStoreError::query_failed(msg)
    }
}
