use std::time::Duration;

use carvote_config::{CarvoteConfig, DEFAULT_ADVANCE_DELAY_MS, DEFAULT_REFETCH_DELAY_MS};

/// Timings the controller needs; passed in from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long a vote result stays up before the next car is fetched.
    pub advance_delay: Duration,
    /// Pause between seeding an empty store and fetching again.
    pub refetch_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(DEFAULT_ADVANCE_DELAY_MS),
            refetch_delay: Duration::from_millis(DEFAULT_REFETCH_DELAY_MS),
        }
    }
}

impl From<&CarvoteConfig> for SessionConfig {
    fn from(config: &CarvoteConfig) -> Self {
        Self {
            advance_delay: config.advance_delay(),
            refetch_delay: config.refetch_delay(),
        }
    }
}
