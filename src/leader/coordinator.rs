use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::control_loop::ControlLoop;
use super::shared::Shared;
use super::CoordinatorState;
use super::LeadershipContext;
use crate::constants::CONTROL_TASK_NAME;
use crate::utils::async_task::spawn_task;
use crate::Candidate;
use crate::CoordinatorError;
use crate::DefaultLeaderEventPublisher;
use crate::ElectionConfig;
use crate::LeaderEventPublisher;
use crate::LockBackend;
use crate::Result;

struct ControlTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Lifecycle {
    destroyed: bool,
    control: Option<ControlTask>,
}

/// Runs leader election for one candidate against one backend.
///
/// # Lifecycle
/// - [`start`](Self::start) spawns the control loop; a no-op while running
/// - [`stop`](Self::stop) ends it, relinquishing leadership first; the
///   coordinator can be started again
/// - [`destroy`](Self::destroy) stops for good
///
/// After `stop` or `destroy` returns, no further candidate callbacks or
/// events are delivered.
///
/// # Example
/// ```ignore
/// let store = Arc::new(MemoryLeaseStore::new());
/// let settings = CoordinatorConfig::new()?.validate()?.election;
/// let backend = Arc::new(TtlLeaseBackend::from_config(store, &settings));
/// let coordinator = LeaderCoordinator::new(Arc::new(DefaultCandidate::default()), backend, settings);
/// coordinator.start().await?;
/// ```
pub struct LeaderCoordinator<B> {
    shared: Arc<Shared<B>>,
    lifecycle: Mutex<Lifecycle>,
    running: AtomicBool,
}

impl<B: LockBackend> LeaderCoordinator<B> {
    /// Builds an idle coordinator publishing to a
    /// [`DefaultLeaderEventPublisher`].
    pub fn new(
        candidate: Arc<dyn Candidate>,
        backend: Arc<B>,
        settings: ElectionConfig,
    ) -> Self {
        let publisher: Arc<dyn LeaderEventPublisher> = Arc::new(DefaultLeaderEventPublisher::default());
        Self {
            shared: Arc::new(Shared::new(candidate, backend, settings, publisher)),
            lifecycle: Mutex::new(Lifecycle::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_publisher(
        self,
        publisher: Arc<dyn LeaderEventPublisher>,
    ) -> Self {
        self.set_leader_event_publisher(publisher);
        self
    }

    /// Replaces the publisher. Takes effect from the next published event,
    /// also while running.
    pub fn set_leader_event_publisher(
        &self,
        publisher: Arc<dyn LeaderEventPublisher>,
    ) {
        self.shared.set_publisher(publisher);
    }

    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.destroyed {
            return Err(CoordinatorError::Destroyed.into());
        }
        if lifecycle.control.is_some() {
            debug!("coordinator for {} already running", self.shared.lease_key);
            return Ok(());
        }

        let shutdown = CancellationToken::new();
        let control = ControlLoop::new(self.shared.clone());
        let handle = spawn_task(CONTROL_TASK_NAME, control.run(shutdown.clone()))?;
        lifecycle.control = Some(ControlTask { shutdown, handle });
        self.running.store(true, Ordering::SeqCst);

        info!("started coordinator for {} as {}", self.shared.lease_key, self.shared.candidate_id());
        Ok(())
    }

    /// Stops the control loop and waits until it has relinquished.
    ///
    /// Idempotent; returns immediately when not running.
    pub async fn stop(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await
    }

    /// Stops and marks the coordinator unusable. Later `start` calls fail
    /// with [`CoordinatorError::Destroyed`].
    pub async fn destroy(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.destroyed = true;
        let result = self.stop_locked(&mut lifecycle).await;
        info!("destroyed coordinator for {}", self.shared.lease_key);
        result
    }

    async fn stop_locked(
        &self,
        lifecycle: &mut Lifecycle,
    ) -> Result<()> {
        let Some(control) = lifecycle.control.take() else {
            return Ok(());
        };
        self.running.store(false, Ordering::SeqCst);
        info!("stopping coordinator for {}", self.shared.lease_key);

        control.shutdown.cancel();
        if let Err(e) = control.handle.await {
            error!("control loop of {} failed: {:?}", self.shared.lease_key, e);
            self.shared.context.set_leader(false);
            self.shared.context.set_fencing_token(None);
            self.shared.set_state(CoordinatorState::Stopped);
            return Err(CoordinatorError::TaskFailed(e).into());
        }
        Ok(())
    }

    /// Current backend holder of the lease, for diagnostics.
    pub async fn current_leader(&self) -> Result<Option<String>> {
        self.shared.backend.current_holder(&self.shared.lease_key).await
    }
}

impl<B> LeaderCoordinator<B> {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_leader(&self) -> bool {
        self.shared.context.is_leader()
    }

    /// A handle onto this coordinator's leadership flags.
    pub fn context(&self) -> LeadershipContext {
        self.shared.context.clone()
    }

    pub fn lease_key(&self) -> &str {
        &self.shared.lease_key
    }

    pub fn candidate_id(&self) -> &str {
        self.shared.candidate_id()
    }

    pub fn role(&self) -> &str {
        self.shared.candidate.role()
    }

    pub fn state(&self) -> CoordinatorState {
        self.shared.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.shared.subscribe()
    }
}

impl<B> Drop for LeaderCoordinator<B> {
    fn drop(&mut self) {
        if let Ok(lifecycle) = self.lifecycle.try_lock() {
            if let Some(control) = &lifecycle.control {
                warn!(
                    "LeaderCoordinator for {} dropped without stop(); cancelling its control loop",
                    self.shared.lease_key
                );
                control.shutdown.cancel();
            }
        }
    }
}
