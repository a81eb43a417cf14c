use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::shared::Shared;
use super::worker::WorkerHandle;
use super::CoordinatorState;
use crate::utils::async_task::with_timeout;
use crate::AcquireOutcome;
use crate::LeaderEventKind;
use crate::LockBackend;
use crate::RenewOutcome;
use crate::Result;

/// Result of one control loop pass, deciding the pause before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Still (or newly) leader.
    Leading,
    /// Gave the lease up on request.
    Relinquished,
    /// Someone else holds the lease, or the attempt failed.
    Contended,
    /// Leadership was taken away.
    Lost,
}

pub(crate) struct ControlLoop<B> {
    shared: Arc<Shared<B>>,
    worker: Option<WorkerHandle>,
}

impl<B: LockBackend> ControlLoop<B> {
    pub(crate) fn new(shared: Arc<Shared<B>>) -> Self {
        Self { shared, worker: None }
    }

    /// Runs until `shutdown` fires, then gives up any held lease.
    ///
    /// A pass in flight always completes: the token is only observed between
    /// passes and while pausing.
    pub(crate) async fn run(
        mut self,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!(
            "control loop started for {} on {}",
            self.shared.candidate_id(),
            self.shared.lease_key
        );
        self.shared.set_state(CoordinatorState::Acquiring);

        while !shutdown.is_cancelled() {
            let tick = self.tick().await;
            let pause = self.pause_after(tick);
            trace!("tick: {:?}, next in {:?}", tick, pause);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(pause) => {}
            }
        }

        if self.shared.context.is_leader() {
            self.relinquish().await;
        }
        self.shared.set_state(CoordinatorState::Stopped);
        info!("control loop stopped for {}", self.shared.candidate_id());
        Ok(())
    }

    pub(crate) async fn tick(&mut self) -> Tick {
        let context = &self.shared.context;
        if context.take_relinquish_request() && context.is_leader() {
            self.relinquish().await;
            return Tick::Relinquished;
        }
        if context.is_leader() {
            return self.heartbeat().await;
        }
        self.try_acquire().await
    }

    async fn try_acquire(&mut self) -> Tick {
        let shared = self.shared.clone();
        let attempt = with_timeout(
            "acquire",
            shared.settings.operation_timeout(),
            shared.backend.acquire(&shared.lease_key, shared.candidate_id()),
        )
        .await;

        match attempt {
            Ok(AcquireOutcome::Acquired { fencing_token }) => {
                self.grant(fencing_token);
                Tick::Leading
            }
            Ok(AcquireOutcome::Held { holder }) => {
                debug!(
                    "{} is not leader of {}, held by {}",
                    shared.candidate_id(),
                    shared.lease_key,
                    holder.as_deref().unwrap_or("another candidate")
                );
                self.failed_to_acquire();
                Tick::Contended
            }
            Err(e) => {
                warn!("Error acquiring leadership of {}: {}", shared.lease_key, e);
                self.failed_to_acquire();
                Tick::Contended
            }
        }
    }

    async fn heartbeat(&mut self) -> Tick {
        let shared = self.shared.clone();
        let renewal = with_timeout(
            "renew",
            shared.settings.operation_timeout(),
            shared.backend.renew(&shared.lease_key, shared.candidate_id()),
        )
        .await;

        match renewal {
            Ok(RenewOutcome::Renewed) => {
                trace!("heartbeat sent for {}", shared.lease_key);
                Tick::Leading
            }
            Ok(RenewOutcome::Lost) => {
                warn!("lease {} no longer records {}, leadership lost", shared.lease_key, shared.candidate_id());
                self.revoke().await;
                Tick::Lost
            }
            Err(e) => {
                warn!("Error sending heartbeat for {}, giving up leadership: {}", shared.lease_key, e);
                self.revoke().await;
                Tick::Lost
            }
        }
    }

    fn grant(
        &mut self,
        fencing_token: Option<u64>,
    ) {
        let shared = &self.shared;
        let context = &shared.context;
        context.clear_relinquish_request();
        context.set_fencing_token(fencing_token);
        context.set_leader(true);
        shared.set_state(CoordinatorState::Leading { fencing_token });
        info!("{} is leader", context);

        shared.publish(LeaderEventKind::Granted);

        match WorkerHandle::spawn(shared.candidate.clone(), context.clone()) {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                error!("failed to spawn work task for {}: {}", context, e);
                context.request_relinquish();
            }
        }
    }

    /// Steps down, then releases the lease. A failed release is left to the
    /// backend's own expiry.
    ///
    /// The work task is stopped before the release so that no other
    /// candidate can be granted while `on_revoked` is still running here.
    async fn relinquish(&mut self) {
        let shared = self.shared.clone();
        shared.set_state(CoordinatorState::Relinquishing);
        self.step_down().await;

        let release = with_timeout(
            "release",
            shared.settings.operation_timeout(),
            shared.backend.release(&shared.lease_key, shared.candidate_id()),
        )
        .await;
        if let Err(e) = release {
            warn!(
                "Error releasing {}, it will lapse when the backend expires it: {}",
                shared.lease_key, e
            );
        }

        self.announce_revoked();
    }

    /// Involuntary loss: the lease is gone or unreachable, nothing to release.
    async fn revoke(&mut self) {
        self.step_down().await;
        self.announce_revoked();
    }

    async fn step_down(&mut self) {
        let context = &self.shared.context;
        context.set_leader(false);
        context.set_fencing_token(None);
        context.clear_relinquish_request();

        if let Some(worker) = self.worker.take() {
            worker.shutdown(self.shared.settings.worker_shutdown_timeout()).await;
        }
    }

    fn announce_revoked(&self) {
        self.shared.publish(LeaderEventKind::Revoked);
        info!("{} leadership revoked", self.shared.context);
        self.shared.set_state(CoordinatorState::Acquiring);
    }

    fn failed_to_acquire(&self) {
        if self.shared.settings.publish_failed_events {
            self.shared.publish(LeaderEventKind::FailedToAcquire);
        }
    }

    pub(crate) fn pause_after(
        &self,
        tick: Tick,
    ) -> Duration {
        let settings = &self.shared.settings;
        match tick {
            Tick::Leading | Tick::Relinquished => settings.heartbeat_interval(),
            Tick::Contended | Tick::Lost => {
                let jitter_ms = settings.acquire_jitter_ms;
                let jitter = if jitter_ms == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
                };
                settings.busy_wait() + jitter
            }
        }
    }
}
