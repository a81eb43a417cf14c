//! The candidate's work task.
//!
//! Spawned on every grant, it runs `on_granted` and then parks until the
//! coordinator cancels it. Once `on_granted` has been entered, `on_revoked`
//! runs exactly once before the task completes, whatever way it exits.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::constants::WORKER_TASK_NAME;
use crate::utils::async_task::spawn_task;
use crate::Candidate;
use crate::LeadershipContext;
use crate::Result;

pub(crate) struct WorkerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn spawn(
        candidate: Arc<dyn Candidate>,
        context: LeadershipContext,
    ) -> Result<Self> {
        let cancel = CancellationToken::new();
        let handle = spawn_task(WORKER_TASK_NAME, run(candidate, context, cancel.clone()))?;
        Ok(Self { cancel, handle })
    }

    /// Cancels the task and waits up to `grace` for `on_revoked` to finish.
    ///
    /// A task that overstays its grace period is aborted; its `on_revoked`
    /// may then be cut short.
    pub(crate) async fn shutdown(
        mut self,
        grace: Duration,
    ) {
        self.cancel.cancel();
        match timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => debug!("work task finished"),
            Ok(Err(e)) => error!("work task failed: {:?}", e),
            Err(_) => {
                warn!("work task did not finish within {:?}, aborting it", grace);
                self.handle.abort();
                let _ = (&mut self.handle).await;
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    candidate: Arc<dyn Candidate>,
    context: LeadershipContext,
    cancel: CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        // Revoked before the task was first polled: the candidate sees neither callback.
        debug!("leadership of {} ended before work started", context.candidate_id());
        return Ok(());
    }

    let granted = AssertUnwindSafe(candidate.on_granted(context.clone())).catch_unwind();

    let failed = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("on_granted of {} interrupted by revocation", context.candidate_id());
            false
        }
        outcome = granted => match outcome {
            Ok(Ok(())) => {
                cancel.cancelled().await;
                false
            }
            Ok(Err(e)) => {
                error!("candidate {} failed in on_granted: {}", context.candidate_id(), e);
                true
            }
            Err(_) => {
                error!("candidate {} panicked in on_granted", context.candidate_id());
                true
            }
        }
    };

    if failed {
        context.request_relinquish();
    }

    match AssertUnwindSafe(candidate.on_revoked(context.clone())).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("candidate {} failed in on_revoked: {}", context.candidate_id(), e),
        Err(_) => error!("candidate {} panicked in on_revoked", context.candidate_id()),
    }
    Ok(())
}
