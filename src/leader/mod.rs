//! Leadership coordination.
//!
//! A [`LeaderCoordinator`] owns one background control loop per started
//! coordinator. The loop drives a [`LockBackend`](crate::LockBackend) through
//! acquire/renew/release and pairs every grant with exactly one revocation:
//!
//! ```text
//!  Idle --start--> Acquiring --acquired--> Leading --yield/stop--> Relinquishing
//!                     ^                      |                        |
//!                     +---- lost/failed -----+------------------------+
//! ```
//!
//! On stop the loop exits into `Stopped`.

mod context;
mod control_loop;
mod coordinator;
mod shared;
mod state;
mod worker;

pub use context::*;
pub use coordinator::*;
pub use state::*;
