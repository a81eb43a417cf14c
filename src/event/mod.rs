//! Leadership event publication.
//!
//! The coordinator reports every leadership transition to a
//! [`LeaderEventPublisher`]. Publisher failures are logged by the caller and
//! never affect the coordinator's state.

mod publisher;
pub use publisher::*;


use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::LeadershipContext;
use crate::Result;

/// Sink for leadership transition notifications.
///
/// `source` identifies the publishing coordinator (its candidate id).
#[cfg_attr(test, automock)]
pub trait LeaderEventPublisher: Send + Sync + 'static {
    fn on_granted(
        &self,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()>;

    fn on_revoked(
        &self,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()>;

    /// Best-effort; only published when `publish_failed_events` is enabled
    fn on_failed_to_acquire(
        &self,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderEventKind {
    Granted,
    Revoked,
    FailedToAcquire,
}

impl fmt::Display for LeaderEventKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            LeaderEventKind::Granted => "granted",
            LeaderEventKind::Revoked => "revoked",
            LeaderEventKind::FailedToAcquire => "failed_to_acquire",
        };
        f.write_str(name)
    }
}

/// A published leadership transition
#[derive(Debug, Clone)]
pub struct LeaderEvent {
    pub kind: LeaderEventKind,
    pub source: String,
    pub role: String,
    pub context: LeadershipContext,
}
