//! Lock/lease backends.
//!
//! The coordinator only talks to a [`LockBackend`]: acquire, renew and
//! release a named lock on behalf of a candidate. Two strategies adapt the
//! raw store primitives to that capability:
//!
//! - [`TtlLeaseBackend`] over a [`LeaseStore`] (etcd style): create-if-absent
//!   with a TTL, conditional refresh as heartbeat, conditional delete.
//! - [`TryLockBackend`] over a [`MutexStore`] (lock registry style): bounded
//!   try-lock, holding the lock is the renewal, unlock on release.
//!
//! Contention is reported through outcome values. `Err` is reserved for the
//! store being unreachable or failing, which the coordinator treats as
//! transient.

mod memory;
mod try_lock;
mod ttl_lease;
pub use memory::*;
pub use try_lock::*;
pub use ttl_lease::*;


use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Result of a leadership acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The lock is now held by the caller.
    Acquired {
        /// Monotonically increasing token of this term, if the store issues one.
        fencing_token: Option<u64>,
    },
    /// The lock is held by another candidate, or could not be obtained
    /// within the bounded wait.
    Held {
        /// Identifier of the current holder, if known.
        holder: Option<String>,
    },
}

impl AcquireOutcome {
    #[must_use]
    pub const fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired { .. })
    }
}

/// Result of a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewOutcome {
    Renewed,
    /// The lease expired or now records another candidate.
    Lost,
}

/// Leadership capability consumed by the coordinator.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LockBackend: Send + Sync + 'static {
    /// Attempts to take the lock `key` for `candidate_id`.
    async fn acquire(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<AcquireOutcome>;

    /// Keeps a held lock alive. Called once per heartbeat while leading.
    async fn renew(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<RenewOutcome>;

    /// Gives the lock up. Best-effort: failures are logged by the caller and
    /// the lock then lapses on its own.
    async fn release(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<()>;

    /// Candidate currently recorded as holder, for diagnostics.
    async fn current_holder(
        &self,
        key: &str,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created {
        /// Store revision of the new entry; doubles as fencing token.
        revision: u64,
    },
    AlreadyExists {
        holder: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// The key is missing, expired or holds a different value.
    ValueMismatch,
}

/// Key-value store with atomic compare-and-set over TTL-scoped entries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LeaseStore: Send + Sync + 'static {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<CreateOutcome>;

    async fn refresh_if_value_matches(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<RefreshOutcome>;

    /// Returns whether an entry was deleted.
    async fn delete_if_value_matches(
        &self,
        key: &str,
        value: &str,
    ) -> Result<bool>;

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired { fencing_token: u64 },
    TimedOut,
}

/// Distributed mutex with owner-checked unlock.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MutexStore: Send + Sync + 'static {
    /// Waits at most `wait` for the lock.
    async fn try_lock(
        &self,
        key: &str,
        owner: &str,
        wait: Duration,
    ) -> Result<LockOutcome>;

    /// Releases the lock if `owner` holds it.
    async fn unlock(
        &self,
        key: &str,
        owner: &str,
    ) -> Result<()>;

    async fn is_locked(
        &self,
        key: &str,
    ) -> Result<bool>;

    async fn holder(
        &self,
        key: &str,
    ) -> Result<Option<String>>;
}
