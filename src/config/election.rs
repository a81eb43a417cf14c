//! Election timing configuration
//!
//! ```toml
//! [election]
//! namespace = "billing"
//! ttl_ms = 10000
//! # heartbeat_interval_ms defaults to ttl_ms / 2
//! busy_wait_ms = 1000
//! ```

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_BUSY_WAIT_MS;
use crate::constants::DEFAULT_NAMESPACE;
use crate::constants::DEFAULT_OPERATION_TIMEOUT_MS;
use crate::constants::DEFAULT_TTL_MS;
use crate::constants::DEFAULT_WORKER_SHUTDOWN_TIMEOUT_MS;
use crate::constants::LEASE_KEY_SEPARATOR;
use crate::Error;
use crate::Result;

/// Timing and naming parameters of the leadership control loop
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElectionConfig {
    /// Prefix of the lease key; the full key is `{namespace}/{role}`
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Lease time-to-live in milliseconds
    ///
    /// The backend expires the lease if it is not refreshed within this
    /// window, which bounds how long a crashed leader blocks the role.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Interval between control loop ticks while leading
    ///
    /// When unset the interval is derived as `ttl_ms / 2`.
    #[serde(default)]
    pub heartbeat_interval_ms: Option<u64>,

    /// Pause after a failed acquisition attempt or an involuntary revocation
    #[serde(default = "default_busy_wait_ms")]
    pub busy_wait_ms: u64,

    /// Upper bound of the random delay added to `busy_wait_ms`
    ///
    /// Spreads retries of competing candidates. 0 disables jitter.
    #[serde(default)]
    pub acquire_jitter_ms: u64,

    /// Deadline applied to every single backend call
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// How long relinquishment waits for the work task before aborting it
    #[serde(default = "default_worker_shutdown_timeout_ms")]
    pub worker_shutdown_timeout_ms: u64,

    /// Publish `on_failed_to_acquire` events for every lost acquisition attempt
    #[serde(default)]
    pub publish_failed_events: bool,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            ttl_ms: default_ttl_ms(),
            heartbeat_interval_ms: None,
            busy_wait_ms: default_busy_wait_ms(),
            acquire_jitter_ms: 0,
            operation_timeout_ms: default_operation_timeout_ms(),
            worker_shutdown_timeout_ms: default_worker_shutdown_timeout_ms(),
            publish_failed_events: false,
        }
    }
}

impl ElectionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Effective heartbeat interval, `ttl / 2` unless configured explicitly
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.unwrap_or(self.ttl_ms / 2))
    }

    pub fn busy_wait(&self) -> Duration {
        Duration::from_millis(self.busy_wait_ms)
    }

    pub fn acquire_jitter(&self) -> Duration {
        Duration::from_millis(self.acquire_jitter_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn worker_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_shutdown_timeout_ms)
    }

    /// Derives the lease key for a role
    pub fn lease_key(
        &self,
        role: &str,
    ) -> String {
        format!("{}{}{}", self.namespace, LEASE_KEY_SEPARATOR, role)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(config_error("namespace cannot be empty".into()));
        }
        if self.namespace.starts_with(LEASE_KEY_SEPARATOR)
            || self.namespace.ends_with(LEASE_KEY_SEPARATOR)
        {
            return Err(config_error(format!(
                "namespace must not start or end with '{LEASE_KEY_SEPARATOR}', got {:?}",
                self.namespace
            )));
        }

        if self.ttl_ms == 0 {
            return Err(config_error("ttl_ms must be greater than 0".into()));
        }

        // A heartbeat slower than the TTL lets the lease expire between renewals
        let heartbeat = self.heartbeat_interval_ms.unwrap_or(self.ttl_ms / 2);
        if heartbeat == 0 || heartbeat >= self.ttl_ms {
            return Err(config_error(format!(
                "heartbeat interval must be between 1 and ttl_ms - 1 ({}), got {}",
                self.ttl_ms - 1,
                heartbeat
            )));
        }

        if self.busy_wait_ms == 0 {
            return Err(config_error("busy_wait_ms must be greater than 0".into()));
        }

        if !(1..=self.ttl_ms).contains(&self.operation_timeout_ms) {
            return Err(config_error(format!(
                "operation_timeout_ms must be between 1 and ttl_ms ({}), got {}",
                self.ttl_ms, self.operation_timeout_ms
            )));
        }

        if self.worker_shutdown_timeout_ms == 0 {
            return Err(config_error(
                "worker_shutdown_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

fn config_error(message: String) -> Error {
    Error::Config(ConfigError::Message(message))
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}
fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}
fn default_busy_wait_ms() -> u64 {
    DEFAULT_BUSY_WAIT_MS
}
fn default_operation_timeout_ms() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_MS
}
fn default_worker_shutdown_timeout_ms() -> u64 {
    DEFAULT_WORKER_SHUTDOWN_TIMEOUT_MS
}
