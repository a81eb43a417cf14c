use tokio::sync::broadcast;
use tracing::debug;

use super::LeaderEvent;
use super::LeaderEventKind;
use super::LeaderEventPublisher;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::LeadershipContext;
use crate::Result;

/// Publisher that fans leader events out to any number of subscribers.
///
/// Events published while nobody is subscribed are dropped. Slow
/// subscribers observe `RecvError::Lagged` once they fall more than the
/// channel capacity behind.
#[derive(Debug, Clone)]
pub struct DefaultLeaderEventPublisher {
    tx: broadcast::Sender<LeaderEvent>,
}

impl Default for DefaultLeaderEventPublisher {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl DefaultLeaderEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeaderEvent> {
        self.tx.subscribe()
    }

    fn publish(
        &self,
        kind: LeaderEventKind,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()> {
        let event = LeaderEvent {
            kind,
            source: source.to_string(),
            role: role.to_string(),
            context: context.clone(),
        };
        if self.tx.send(event).is_err() {
            debug!("no subscribers for {} event of role {}", kind, role);
        }
        Ok(())
    }
}

impl LeaderEventPublisher for DefaultLeaderEventPublisher {
    fn on_granted(
        &self,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()> {
        self.publish(LeaderEventKind::Granted, source, context, role)
    }

    fn on_revoked(
        &self,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()> {
        self.publish(LeaderEventKind::Revoked, source, context, role)
    }

    fn on_failed_to_acquire(
        &self,
        source: &str,
        context: &LeadershipContext,
        role: &str,
    ) -> Result<()> {
        self.publish(LeaderEventKind::FailedToAcquire, source, context, role)
    }
}
