//! In-process stores for tests, demos and single-process deployments.
//!
//! Both stores share one process-wide view of the lock state. Each has a
//! reachability switch so callers can simulate the store going offline.

mod lease_store;
mod mutex_store;
pub use lease_store::*;
pub use mutex_store::*;
