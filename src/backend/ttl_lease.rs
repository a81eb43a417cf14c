use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tracing::warn;

use super::AcquireOutcome;
use super::CreateOutcome;
use super::LeaseStore;
use super::LockBackend;
use super::RefreshOutcome;
use super::RenewOutcome;
use crate::ElectionConfig;
use crate::Result;

/// Lease strategy: the lock is a TTL-scoped key whose value is the holder id.
///
/// - acquire: create the key if absent
/// - renew: refresh the TTL only while the key still records our id
/// - release: delete the key only while it still records our id
pub struct TtlLeaseBackend<S: LeaseStore> {
    store: Arc<S>,
    ttl: Duration,
}

impl<S: LeaseStore> TtlLeaseBackend<S> {
    pub fn new(
        store: Arc<S>,
        ttl: Duration,
    ) -> Self {
        Self { store, ttl }
    }

    pub fn from_config(
        store: Arc<S>,
        settings: &ElectionConfig,
    ) -> Self {
        Self::new(store, settings.ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: LeaseStore> LockBackend for TtlLeaseBackend<S> {
    async fn acquire(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<AcquireOutcome> {
        match self.store.create_if_absent(key, candidate_id, self.ttl).await? {
            CreateOutcome::Created { revision } => Ok(AcquireOutcome::Acquired {
                fencing_token: Some(revision),
            }),
            CreateOutcome::AlreadyExists { holder } if holder.as_deref() == Some(candidate_id) => {
                // A previous create may have succeeded after the caller gave
                // up on it; the entry is ours, so adopt it.
                debug!("lease {} already records {}, adopting it", key, candidate_id);
                match self.store.refresh_if_value_matches(key, candidate_id, self.ttl).await? {
                    RefreshOutcome::Refreshed => Ok(AcquireOutcome::Acquired {
                        fencing_token: None,
                    }),
                    RefreshOutcome::ValueMismatch => Ok(AcquireOutcome::Held { holder: None }),
                }
            }
            CreateOutcome::AlreadyExists { holder } => Ok(AcquireOutcome::Held { holder }),
        }
    }

    async fn renew(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<RenewOutcome> {
        match self.store.refresh_if_value_matches(key, candidate_id, self.ttl).await? {
            RefreshOutcome::Refreshed => Ok(RenewOutcome::Renewed),
            RefreshOutcome::ValueMismatch => Ok(RenewOutcome::Lost),
        }
    }

    async fn release(
        &self,
        key: &str,
        candidate_id: &str,
    ) -> Result<()> {
        if !self.store.delete_if_value_matches(key, candidate_id).await? {
            warn!(
                "Couldn't delete lease {} because candidate {} was not leader",
                key, candidate_id
            );
        }
        Ok(())
    }

    async fn current_holder(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.store.get(key).await
    }
}
