use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::AcquireOutcome;
use super::LockBackend;
use super::LockOutcome;
use super::MutexStore;
use super::RenewOutcome;
use crate::LockConfig;
use crate::Result;

/// Mutex strategy: leadership is the possession of a distributed lock.
///
/// A lock held by someone else and a wait that timed out are reported the
/// same way, as [`AcquireOutcome::Held`]. Renewal extends nothing, since the
/// store keeps the lock until it is unlocked, but it does confirm the lock is
/// still ours: a store can drop it behind our back when our session dies.
pub struct TryLockBackend<M: MutexStore> {
    store: Arc<M>,
    wait: Duration,
}

impl<M: MutexStore> TryLockBackend<M> {
    pub fn new(
        store: Arc<M>,
        wait: Duration,
    ) -> Self {
        Self { store, wait }
    }

    pub fn from_config(
        store: Arc<M>,
        settings: &LockConfig,
    ) -> Self {
        Self::new(store, settings.wait())
    }

    pub fn store(&self) -> &Arc<M> {
        &self.store
    }
}

#[async_trait]
impl<M: MutexStore> LockBackend for TryLockBackend<M> {
    async fn acquire(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<AcquireOutcome> {
        match self.store.try_lock(key, candidate_id, self.wait).await? {
            LockOutcome::Acquired { fencing_token } => Ok(AcquireOutcome::Acquired {
                fencing_token: Some(fencing_token),
            }),
            LockOutcome::TimedOut => Ok(AcquireOutcome::Held { holder: None }),
        }
    }

    async fn renew(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<RenewOutcome> {
        if !self.store.is_locked(key).await? {
            debug!("lock {} is no longer held by anyone", key);
            return Ok(RenewOutcome::Lost);
        }
        match self.store.holder(key).await? {
            Some(holder) if holder == candidate_id => Ok(RenewOutcome::Renewed),
            holder => {
                debug!("lock {} is now held by {:?}, not {}", key, holder, candidate_id);
                Ok(RenewOutcome::Lost)
            }
        }
    }

    async fn release(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<()> {
        self.store.unlock(key, candidate_id).await
    }

    async fn current_holder(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.store.holder(key).await
    }
}
