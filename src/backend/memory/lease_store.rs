use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use crate::backend::CreateOutcome;
use crate::backend::LeaseStore;
use crate::backend::RefreshOutcome;
use crate::BackendError;
use crate::Result;

#[derive(Debug, Clone)]
struct LeaseEntry {
    value: String,
    expires_at: Instant,
}

impl LeaseEntry {
    fn is_live(
        &self,
        now: Instant,
    ) -> bool {
        self.expires_at > now
    }
}

/// TTL key-value store kept in a [`DashMap`].
///
/// Entries expire against the tokio clock, so paused-time tests can advance
/// past a TTL without sleeping. Every successful create bumps a store-wide
/// revision which is handed back as the fencing token.
#[derive(Debug)]
pub struct MemoryLeaseStore {
    entries: DashMap<String, LeaseEntry>,
    revision: AtomicU64,
    reachable: AtomicBool,
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            revision: AtomicU64::new(0),
            reachable: AtomicBool::new(true),
        }
    }

    /// While unreachable every operation fails with
    /// [`BackendError::Unreachable`]. Entries keep expiring meanwhile.
    pub fn set_reachable(
        &self,
        reachable: bool,
    ) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    /// Unconditionally writes `key`, as a foreign writer would.
    pub fn put(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> u64 {
        let revision = self.next_revision();
        self.entries.insert(
            key.to_string(),
            LeaseEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        revision
    }

    /// Drops `key` as if its TTL had elapsed.
    pub fn expire(
        &self,
        key: &str,
    ) {
        self.entries.remove(key);
    }

    /// Latest revision handed out.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(BackendError::Unreachable("in-memory lease store is offline".to_string()).into())
        }
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<CreateOutcome> {
        self.ensure_reachable()?;
        let now = Instant::now();
        let fresh = |revision_source: &Self| {
            (
                revision_source.next_revision(),
                LeaseEntry {
                    value: value.to_string(),
                    expires_at: now + ttl,
                },
            )
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) if occupied.get().is_live(now) => Ok(CreateOutcome::AlreadyExists {
                holder: Some(occupied.get().value.clone()),
            }),
            Entry::Occupied(mut occupied) => {
                trace!("lease {} expired, replacing it", key);
                let (revision, entry) = fresh(self);
                occupied.insert(entry);
                Ok(CreateOutcome::Created { revision })
            }
            Entry::Vacant(vacant) => {
                let (revision, entry) = fresh(self);
                vacant.insert(entry);
                Ok(CreateOutcome::Created { revision })
            }
        }
    }

    async fn refresh_if_value_matches(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<RefreshOutcome> {
        self.ensure_reachable()?;
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.is_live(now) && entry.value == value => {
                entry.expires_at = now + ttl;
                Ok(RefreshOutcome::Refreshed)
            }
            _ => Ok(RefreshOutcome::ValueMismatch),
        }
    }

    async fn delete_if_value_matches(
        &self,
        key: &str,
        value: &str,
    ) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(self.entries.remove_if(key, |_, entry| entry.value == value).is_some())
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.ensure_reachable()?;
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }
}
