use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout_at;
use tokio::time::Instant;
use tracing::debug;

use crate::backend::LockOutcome;
use crate::backend::MutexStore;
use crate::BackendError;
use crate::Result;

#[derive(Debug, Clone)]
struct LockEntry {
    owner: String,
    fencing_token: u64,
}

/// Named mutexes with owner-checked unlock.
///
/// Locking is reentrant per owner: a holder asking again gets its current
/// token back. Waiters in [`MutexStore::try_lock`] are woken on every unlock
/// and race for the freed lock.
#[derive(Debug)]
pub struct MemoryMutexStore {
    locks: Mutex<HashMap<String, LockEntry>>,
    released: Notify,
    next_token: AtomicU64,
    reachable: AtomicBool,
}

impl Default for MemoryMutexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMutexStore {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            released: Notify::new(),
            next_token: AtomicU64::new(0),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(
        &self,
        reachable: bool,
    ) {
        self.reachable.store(reachable, Ordering::SeqCst);
        if reachable {
            self.released.notify_waiters();
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    /// Releases `key` regardless of owner, as a store does when the
    /// holder's session dies.
    pub fn force_unlock(
        &self,
        key: &str,
    ) {
        if self.locks.lock().remove(key).is_some() {
            self.released.notify_waiters();
        }
    }

    fn lock_now(
        &self,
        key: &str,
        owner: &str,
    ) -> Option<u64> {
        let mut locks = self.locks.lock();
        match locks.get(key) {
            Some(entry) if entry.owner == owner => Some(entry.fencing_token),
            Some(_) => None,
            None => {
                let fencing_token = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
                locks.insert(
                    key.to_string(),
                    LockEntry {
                        owner: owner.to_string(),
                        fencing_token,
                    },
                );
                Some(fencing_token)
            }
        }
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            Err(BackendError::Unreachable("in-memory mutex store is offline".to_string()).into())
        }
    }
}

#[async_trait]
impl MutexStore for MemoryMutexStore {
    async fn try_lock(
        &self,
        key: &str,
        owner: &str,
        wait: Duration,
    ) -> Result<LockOutcome> {
        let deadline = Instant::now() + wait;
        loop {
            self.ensure_reachable()?;

            // Register interest before checking so an unlock in between is not missed.
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if let Some(fencing_token) = self.lock_now(key, owner) {
                return Ok(LockOutcome::Acquired { fencing_token });
            }
            if timeout_at(deadline, released).await.is_err() {
                return Ok(LockOutcome::TimedOut);
            }
        }
    }

    async fn unlock(
        &self,
        key: &str,
        owner: &str,
    ) -> Result<()> {
        self.ensure_reachable()?;
        let removed = {
            let mut locks = self.locks.lock();
            match locks.get(key) {
                Some(entry) if entry.owner == owner => locks.remove(key).is_some(),
                _ => false,
            }
        };
        if removed {
            self.released.notify_waiters();
        } else {
            debug!("{} does not hold lock {}, nothing to unlock", owner, key);
        }
        Ok(())
    }

    async fn is_locked(
        &self,
        key: &str,
    ) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(self.locks.lock().contains_key(key))
    }

    async fn holder(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.ensure_reachable()?;
        Ok(self.locks.lock().get(key).map(|entry| entry.owner.clone()))
    }
}
