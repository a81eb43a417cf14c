use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::error;

use crate::BackendError;
use crate::CoordinatorError;
use crate::Result;

/// Bounds a single backend call.
///
/// Elapsed deadlines are reported as [`BackendError::Timeout`] so that the
/// control loop treats them like any other transient backend failure.
pub(crate) async fn with_timeout<F, T>(
    operation: &'static str,
    duration: Duration,
    task: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, task).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            operation,
            duration,
        }
        .into()),
    }
}

/// Spawns a named background task on the current runtime.
///
/// An error returned by the task is logged with the task name. Fails with
/// [`CoordinatorError::NoRuntime`] when called outside a tokio runtime.
pub(crate) fn spawn_task<Fut>(
    name: &'static str,
    task: Fut,
) -> Result<JoinHandle<()>>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| CoordinatorError::NoRuntime { task: name })?;

    Ok(runtime.spawn(async move {
        if let Err(e) = task.await {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
    }))
}
