//! Typed errors for object store operations
//!
//! Configuration and orchestration code works with `anyhow`. Store calls use
//! [`StoreError`] instead because the query loop has to tell a fired deadline
//! apart from a real backend failure.

use thiserror::Error;
use tokio::task::JoinError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single object store request
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object '{key}' not found")]
    NotFound { key: String },

    #[error("request for '{key}' failed: {source}")]
    Backend {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("reading upload body for '{key}': {source}")]
    Body {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request cancelled")]
    Cancelled,
}

impl StoreError {
    /// Wrap any backend error for `key`
    pub fn backend(key: &str, source: impl Into<BoxError>) -> Self {
        StoreError::Backend {
            key: key.to_string(),
            source: source.into(),
        }
    }

    /// True when the request ended because the run's deadline fired or the
    /// run was cancelled. Probe loops treat this as normal completion.
    pub fn is_termination(&self) -> bool {
        matches!(self, StoreError::DeadlineExceeded | StoreError::Cancelled)
    }
}

/// Failure recorded in a transfer worker's result slot
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("worker task failed: {0}")]
    Join(#[from] JoinError),
}
