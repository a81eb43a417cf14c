//! Leadership candidates.
//!
//! A [`Candidate`] is the application-side participant of an election. The
//! coordinator calls [`Candidate::on_granted`] on a dedicated work task when
//! leadership is acquired and [`Candidate::on_revoked`] exactly once when it
//! ends, whether it was yielded, lost, stopped or `on_granted` failed.


use async_trait::async_trait;
use tracing::info;

use crate::constants::DEFAULT_ROLE;
use crate::LeadershipContext;
use crate::Result;

#[async_trait]
pub trait Candidate: Send + Sync + 'static {
    /// Unique identifier, stored as the lease value
    fn id(&self) -> &str;

    /// Role competed for; one lease exists per role
    fn role(&self) -> &str;

    /// Runs when leadership is granted.
    ///
    /// May run for as long as leadership lasts. The future is dropped when
    /// the coordinator revokes leadership, so long-running work must only
    /// block at `.await` points. Returning `Ok` does not end leadership;
    /// returning `Err` (or panicking) requests relinquishment.
    async fn on_granted(
        &self,
        ctx: LeadershipContext,
    ) -> Result<()>;

    /// Runs once after leadership ends
    async fn on_revoked(
        &self,
        ctx: LeadershipContext,
    ) -> Result<()>;
}

/// Candidate that only logs its leadership transitions.
#[derive(Debug, Clone)]
pub struct DefaultCandidate {
    id: String,
    role: String,
}

impl Default for DefaultCandidate {
    /// Random id, role `"leader"`
    fn default() -> Self {
        Self::new(nanoid::nanoid!(), DEFAULT_ROLE)
    }
}

impl DefaultCandidate {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }

    pub fn with_role(role: impl Into<String>) -> Self {
        Self::new(nanoid::nanoid!(), role)
    }
}

#[async_trait]
impl Candidate for DefaultCandidate {
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
        info!("{} has been granted leadership; context: {}", self.id, ctx);
        Ok(())
    }

    async fn on_revoked(
        &self,
        ctx: LeadershipContext,
    ) -> Result<()> {
        info!("{} leadership has been revoked; context: {}", self.id, ctx);
        Ok(())
    }
}
