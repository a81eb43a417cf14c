// -
// Lease key namespaces

/// Namespace prefix for lease keys when none is configured
pub(crate) const DEFAULT_NAMESPACE: &str = "d-leader";

/// Role assigned to candidates that do not specify one
pub(crate) const DEFAULT_ROLE: &str = "leader";

/// Separator between namespace and role in the lease key
pub(crate) const LEASE_KEY_SEPARATOR: char = '/';

// -
// Timing defaults (milliseconds)

/// Lease TTL. The heartbeat interval defaults to half of it.
pub(crate) const DEFAULT_TTL_MS: u64 = 10_000;

pub(crate) const DEFAULT_BUSY_WAIT_MS: u64 = 1_000;

pub(crate) const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 3_000;

/// Upper bound on waiting for the work task to exit after cancellation
pub(crate) const DEFAULT_WORKER_SHUTDOWN_TIMEOUT_MS: u64 = 30_000;

/// Bounded wait of a single try-lock attempt
pub(crate) const DEFAULT_LOCK_WAIT_MS: u64 = 1_000;

/// Capacity of the default publisher's broadcast channel
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 64;

// -
// Task names

pub(crate) const CONTROL_TASK_NAME: &str = "leader-control";
pub(crate) const WORKER_TASK_NAME: &str = "leader-worker";
