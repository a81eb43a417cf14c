use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::error;

use super::CoordinatorState;
use super::LeadershipContext;
use crate::Candidate;
use crate::ElectionConfig;
use crate::LeaderEventKind;
use crate::LeaderEventPublisher;

/// State shared between a coordinator handle and its control loop.
pub(crate) struct Shared<B> {
    pub(crate) candidate: Arc<dyn Candidate>,
    pub(crate) backend: Arc<B>,
    pub(crate) settings: ElectionConfig,
    pub(crate) lease_key: String,
    pub(crate) context: LeadershipContext,
    publisher: ArcSwap<Arc<dyn LeaderEventPublisher>>,
    state_tx: watch::Sender<CoordinatorState>,
    state_rx: watch::Receiver<CoordinatorState>,
}

impl<B> Shared<B> {
    pub(crate) fn new(
        candidate: Arc<dyn Candidate>,
        backend: Arc<B>,
        settings: ElectionConfig,
        publisher: Arc<dyn LeaderEventPublisher>,
    ) -> Self {
        let lease_key = settings.lease_key(candidate.role());
        let context = LeadershipContext::new(candidate.role(), candidate.id());
        let (state_tx, state_rx) = watch::channel(CoordinatorState::Idle);
        Self {
            candidate,
            backend,
            settings,
            lease_key,
            context,
            publisher: ArcSwap::from_pointee(publisher),
            state_tx,
            state_rx,
        }
    }

    pub(crate) fn candidate_id(&self) -> &str {
        self.candidate.id()
    }

    pub(crate) fn set_publisher(
        &self,
        publisher: Arc<dyn LeaderEventPublisher>,
    ) {
        self.publisher.store(Arc::new(publisher));
    }

    pub(crate) fn set_state(
        &self,
        state: CoordinatorState,
    ) {
        self.state_tx.send_replace(state);
    }

    pub(crate) fn state(&self) -> CoordinatorState {
        *self.state_rx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state_rx.clone()
    }

    /// Hands a transition to the current publisher.
    ///
    /// Errors and panics raised by the publisher are logged and swallowed.
    pub(crate) fn publish(
        &self,
        kind: LeaderEventKind,
    ) {
        let publisher = self.publisher.load_full();
        let source = self.candidate.id();
        let role = self.candidate.role();
        let context = &self.context;

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| match kind {
            LeaderEventKind::Granted => publisher.on_granted(source, context, role),
            LeaderEventKind::Revoked => publisher.on_revoked(source, context, role),
            LeaderEventKind::FailedToAcquire => publisher.on_failed_to_acquire(source, context, role),
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Error publishing {} event for {}: {}", kind, context, e),
            Err(_) => error!("Publisher panicked on {} event for {}", kind, context),
        }
    }
}
