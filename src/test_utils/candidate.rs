use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::Candidate;
use crate::Error;
use crate::LeadershipContext;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateEvent {
    Granted,
    Revoked,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum OnGranted {
    Return,
    Fail,
    Panic,
    /// Never returns until cancelled
    Block,
    /// Sleeps, then yields leadership
    YieldAfter(Duration),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum OnRevoked {
    Return,
    Hang,
}

/// Candidate that records its callbacks in order
pub(crate) struct RecordingCandidate {
    id: String,
    role: String,
    on_granted: OnGranted,
    on_revoked: OnRevoked,
    events: Arc<Mutex<Vec<CandidateEvent>>>,
}

impl RecordingCandidate {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            role: "scheduler".to_string(),
            on_granted: OnGranted::Return,
            on_revoked: OnRevoked::Return,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn granting(
        mut self,
        behavior: OnGranted,
    ) -> Self {
        self.on_granted = behavior;
        self
    }

    pub(crate) fn revoking(
        mut self,
        behavior: OnRevoked,
    ) -> Self {
        self.on_revoked = behavior;
        self
    }

    pub(crate) fn events(&self) -> Vec<CandidateEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn count(
        &self,
        event: CandidateEvent,
    ) -> usize {
        self.events.lock().iter().filter(|e| **e == event).count()
    }
}

#[async_trait]
impl Candidate for RecordingCandidate {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> &str {
        &self.role
    }

    async fn on_granted(
        &self,
        ctx: LeadershipContext,
    ) -> Result<()> {
        self.events.lock().push(CandidateEvent::Granted);
        match self.on_granted {
            OnGranted::Return => Ok(()),
            OnGranted::Fail => Err(Error::Candidate("refusing to lead".to_string())),
            OnGranted::Panic => panic!("candidate blew up"),
            OnGranted::Block => {
                std::future::pending::<()>().await;
                Ok(())
            }
            OnGranted::YieldAfter(delay) => {
                tokio::time::sleep(delay).await;
                ctx.yield_leadership();
                Ok(())
            }
        }
    }

    async fn on_revoked(
        &self,
        _ctx: LeadershipContext,
    ) -> Result<()> {
        self.events.lock().push(CandidateEvent::Revoked);
        if let OnRevoked::Hang = self.on_revoked {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
