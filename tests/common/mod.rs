//! Candidates, stores and timings shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use d_leader::BackendError;
use d_leader::Candidate;
use d_leader::CreateOutcome;
use d_leader::ElectionConfig;
use d_leader::LeaderCoordinator;
use d_leader::LeaseStore;
use d_leader::LeadershipContext;
use d_leader::MemoryLeaseStore;
use d_leader::MemoryMutexStore;
use d_leader::RefreshOutcome;
use d_leader::Result;
use d_leader::TryLockBackend;
use d_leader::TtlLeaseBackend;
use parking_lot::Mutex;
use tokio::time::Instant;

pub const ROLE: &str = "r";

/// Generous bound for convergence under the paused clock.
pub const SETTLE: Duration = Duration::from_secs(5);

/// TTL 1s, heartbeat 500ms, busy wait 100ms.
pub fn election_config() -> ElectionConfig {
    ElectionConfig {
        namespace: "it".to_string(),
        ttl_ms: 1_000,
        heartbeat_interval_ms: None,
        busy_wait_ms: 100,
        acquire_jitter_ms: 20,
        operation_timeout_ms: 200,
        worker_shutdown_timeout_ms: 1_000,
        publish_failed_events: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    Granted,
    Revoked,
}

/// Counts how many candidates of one group are between `on_granted` and
/// `on_revoked` at the same time.
#[derive(Default)]
pub struct LeaderTally {
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl LeaderTally {
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TrackingCandidate {
    id: String,
    tally: Arc<LeaderTally>,
    callbacks: Mutex<Vec<Callback>>,
}

impl TrackingCandidate {
    pub fn new(
        id: &str,
        tally: &Arc<LeaderTally>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            tally: tally.clone(),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    pub fn callbacks(&self) -> Vec<Callback> {
        self.callbacks.lock().clone()
    }

    pub fn count(
        &self,
        callback: Callback,
    ) -> usize {
        self.callbacks.lock().iter().filter(|c| **c == callback).count()
    }

    /// Granted and Revoked strictly alternate, starting with Granted.
    pub fn is_well_paired(&self) -> bool {
        self.callbacks().iter().enumerate().all(|(i, c)| {
            let expected = if i % 2 == 0 {
                Callback::Granted
            } else {
                Callback::Revoked
            };
            *c == expected
        })
    }
}

#[async_trait]
impl Candidate for TrackingCandidate {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> &str {
        ROLE
    }

    async fn on_granted(
        &self,
        _ctx: LeadershipContext,
    ) -> Result<()> {
        self.tally.enter();
        self.callbacks.lock().push(Callback::Granted);
        Ok(())
    }

    async fn on_revoked(
        &self,
        _ctx: LeadershipContext,
    ) -> Result<()> {
        self.callbacks.lock().push(Callback::Revoked);
        self.tally.leave();
        Ok(())
    }
}

/// One node's view of a shared lease store, with its own partition switch.
pub struct PartitionedLeaseStore {
    inner: Arc<MemoryLeaseStore>,
    partitioned: AtomicBool,
}

impl PartitionedLeaseStore {
    pub fn new(inner: &Arc<MemoryLeaseStore>) -> Arc<Self> {
        Arc::new(Self {
            inner: inner.clone(),
            partitioned: AtomicBool::new(false),
        })
    }

    pub fn partition(
        &self,
        partitioned: bool,
    ) {
        self.partitioned.store(partitioned, Ordering::SeqCst);
    }

    fn reach(&self) -> Result<&MemoryLeaseStore> {
        if self.partitioned.load(Ordering::SeqCst) {
            return Err(BackendError::Unreachable("partitioned".to_string()).into());
        }
        Ok(&self.inner)
    }
}

#[async_trait]
impl LeaseStore for PartitionedLeaseStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<CreateOutcome> {
        self.reach()?.create_if_absent(key, value, ttl).await
    }

    async fn refresh_if_value_matches(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<RefreshOutcome> {
        self.reach()?.refresh_if_value_matches(key, value, ttl).await
    }

    async fn delete_if_value_matches(
        &self,
        key: &str,
        value: &str,
    ) -> Result<bool> {
        self.reach()?.delete_if_value_matches(key, value).await
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.reach()?.get(key).await
    }
}

pub type LeaseNode = LeaderCoordinator<TtlLeaseBackend<MemoryLeaseStore>>;
pub type PartitionedNode = LeaderCoordinator<TtlLeaseBackend<PartitionedLeaseStore>>;
pub type LockNode = LeaderCoordinator<TryLockBackend<MemoryMutexStore>>;

pub fn lease_node(
    store: &Arc<MemoryLeaseStore>,
    candidate: &Arc<TrackingCandidate>,
) -> LeaseNode {
    let settings = election_config();
    let backend = Arc::new(TtlLeaseBackend::from_config(store.clone(), &settings));
    LeaderCoordinator::new(candidate.clone(), backend, settings)
}

pub fn partitioned_node(
    store: &Arc<PartitionedLeaseStore>,
    candidate: &Arc<TrackingCandidate>,
) -> PartitionedNode {
    let settings = election_config();
    let backend = Arc::new(TtlLeaseBackend::from_config(store.clone(), &settings));
    LeaderCoordinator::new(candidate.clone(), backend, settings)
}

pub fn lock_node(
    store: &Arc<MemoryMutexStore>,
    candidate: &Arc<TrackingCandidate>,
) -> LockNode {
    let backend = Arc::new(TryLockBackend::new(store.clone(), Duration::from_millis(50)));
    LeaderCoordinator::new(candidate.clone(), backend, election_config())
}

/// Polls `condition` every 10ms until it holds or `limit` elapses.
pub async fn wait_until(
    limit: Duration,
    mut condition: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Samples `is_leader` of every coordinator for `duration` and returns the
/// highest number of simultaneous leaders observed.
pub async fn max_simultaneous_leaders<B>(
    nodes: &[LeaderCoordinator<B>],
    duration: Duration,
) -> usize {
    let deadline = Instant::now() + duration;
    let mut max = 0;
    while Instant::now() < deadline {
        max = max.max(nodes.iter().filter(|n| n.is_leader()).count());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    max
}
