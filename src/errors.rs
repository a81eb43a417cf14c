//! Leader Election Error Hierarchy
//!
//! Defines the error types surfaced by the coordinator, categorized by where
//! the failure originates. Lock contention is deliberately absent: "someone
//! else holds the lease" is an ordinary outcome value, not an error.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Coordinator configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lock/lease backend failures (network, timeout, I/O)
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Coordinator lifecycle failures
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// Candidate `on_granted` / `on_revoked` callback failures
    #[error("Candidate callback failed: {0}")]
    Candidate(String),

    /// Leader event publisher failures
    #[error("Event publication failed: {0}")]
    Publisher(String),

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Error {
    /// Transient errors are retried implicitly by the next control loop tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backing store cannot be reached
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// A single backend call exceeded its deadline
    #[error("Backend operation {operation} timed out after {duration:?}")]
    Timeout {
        operation: &'static str,
        duration: Duration,
    },

    /// Transport or storage failures reported by the adapter
    #[error("Backend I/O failure: {source}")]
    Io {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// `start()` was called after `destroy()`
    #[error("Coordinator has been destroyed")]
    Destroyed,

    /// No tokio runtime is available to host background tasks
    #[error("No tokio runtime available to spawn {task}")]
    NoRuntime { task: &'static str },

    /// Background task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}
