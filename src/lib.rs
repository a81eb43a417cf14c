//! # d-leader
//!
//! Lease-based leader election for a group of candidates competing for one
//! role through a shared lock backend.
//!
//! - [`LeaderCoordinator`] runs the election for one [`Candidate`]
//! - [`LockBackend`] abstracts the store: [`TtlLeaseBackend`] for TTL leases,
//!   [`TryLockBackend`] for distributed mutexes
//! - [`LeaderEventPublisher`] receives granted/revoked/failed-to-acquire
//!   notifications
//! - [`CoordinatorConfig`] loads settings from defaults, a TOML file and
//!   `LEADER__*` environment variables
//!
//! ```ignore
//! use std::sync::Arc;
//! use d_leader::*;
//!
//! let settings = CoordinatorConfig::new()?.validate()?;
//! let store = Arc::new(MemoryLeaseStore::new());
//! let backend = Arc::new(TtlLeaseBackend::from_config(store, &settings.election));
//! let coordinator = LeaderCoordinator::new(
//!     Arc::new(DefaultCandidate::default()),
//!     backend,
//!     settings.election,
//! );
//! coordinator.start().await?;
//! // ...
//! coordinator.destroy().await?;
//! ```

mod backend;
mod candidate;
mod config;
mod constants;
mod errors;
mod event;
mod leader;
pub(crate) mod utils;

pub use backend::*;
pub use candidate::*;
pub use config::*;
pub use errors::*;
pub use event::*;
pub use leader::*;

#[cfg(test)]
pub(crate) mod test_utils;
