//! Error types for cache stores.

use std::time::Duration;

/// Errors that can occur when talking to a cache backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The backend cannot be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The operation did not complete in time.
    #[error("store operation timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// The backend answered with an error.
    #[error("store error: {0}")]
    Backend(String),

    /// The connection URL could not be parsed.
    #[error("invalid store url: {0}")]
    InvalidUrl(String),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            millis: after.as_millis() as u64,
        }
    }

    /// Creates a new backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns true if the backend should be considered down.
    ///
    /// Callers stop talking to the store for a while after one of these.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Timeout { .. } | Self::Closed
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Timeout { .. } => "timeout",
            Self::Backend(_) => "backend",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Closed => "closed",
        }
    }
}
