//! Configuration management module for the leader election coordinator.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod election;
mod lock;
pub use election::*;
pub use lock::*;
use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Environment variable prefix, e.g. `LEADER__ELECTION__TTL_MS=4000`
const ENV_PREFIX: &str = "LEADER";

/// Main configuration container for the coordinator
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CoordinatorConfig {
    /// Lease, heartbeat and retry timing shared by both strategies
    #[serde(default)]
    pub election: ElectionConfig,
    /// Try-lock strategy parameters
    #[serde(default)]
    pub lock: LockConfig,
}

impl CoordinatorConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `LEADER__` prefix (highest priority)
    ///
    /// # Note
    /// This method does NOT validate the configuration. Callers MUST call `validate()`
    /// before handing the configuration to a coordinator.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("LEADER__ELECTION__TTL_MS", "4000");
    /// let cfg = CoordinatorConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// Consumes self and performs validation of all subsystems plus the
    /// cross-section constraint that a single try-lock wait fits inside the
    /// per-operation timeout.
    pub fn validate(self) -> Result<Self> {
        self.election.validate()?;
        self.lock.validate()?;

        if self.lock.wait_ms >= self.election.operation_timeout_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "lock.wait_ms ({}) must be less than election.operation_timeout_ms ({})",
                self.lock.wait_ms, self.election.operation_timeout_ms
            ))));
        }

        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
