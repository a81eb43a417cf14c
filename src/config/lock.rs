use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_LOCK_WAIT_MS;
use crate::Error;
use crate::Result;

/// Parameters of the try-lock (mutex) acquisition strategy
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LockConfig {
    /// Bounded wait of one `try_lock` attempt, in milliseconds
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_ms: default_wait_ms(),
        }
    }
}

impl LockConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wait_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lock.wait_ms must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_wait_ms() -> u64 {
    DEFAULT_LOCK_WAIT_MS
}
