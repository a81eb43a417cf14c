//! Candidates and helpers shared by the unit tests
mod candidate;
pub(crate) use candidate::*;

use std::time::Duration;

use tokio::time::Instant;

use crate::ElectionConfig;

/// Short timings for paused-clock tests: 500ms heartbeat, 100ms busy wait.
pub(crate) fn fast_election_config() -> ElectionConfig {
    ElectionConfig {
        namespace: "test".to_string(),
        ttl_ms: 1_000,
        heartbeat_interval_ms: None,
        busy_wait_ms: 100,
        acquire_jitter_ms: 0,
        operation_timeout_ms: 200,
        worker_shutdown_timeout_ms: 1_000,
        publish_failed_events: false,
    }
}

/// Polls `condition` every 10ms until it holds or `limit` elapses.
pub(crate) async fn wait_until(
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
