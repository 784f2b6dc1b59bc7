use std::time::Duration;

use serde::Deserialize;

use crate::error::EngineError;

// ═══════════════════════════════════════════════════════════════
//  [store]
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Number of most recent records kept.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    entry_store::DEFAULT_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

// ═══════════════════════════════════════════════════════════════
//  [timestamp]
// ═══════════════════════════════════════════════════════════════

/// Periodic `timestamp:` record injection.
#[derive(Debug, Clone, Deserialize)]
pub struct TimestampConfig {
    #[serde(default = "default_timestamp_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_timestamp_enabled() -> bool {
    true
}
fn default_interval_secs() -> u64 {
    10
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            enabled: default_timestamp_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  EngineConfig
// ═══════════════════════════════════════════════════════════════

/// Everything the engine needs at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub capacity: usize,
    /// `None` disables the timestamp task.
    pub timestamp_interval: Option<Duration>,
    /// Terminator appended to timestamp records.
    pub terminator: u8,
}

impl EngineConfig {
    pub fn new(
        store: &StoreConfig,
        timestamp: &TimestampConfig,
        terminator: u8,
    ) -> Result<Self, EngineError> {
        if store.capacity == 0 {
            return Err(EngineError::Config("store.capacity must be > 0".into()));
        }
        if timestamp.enabled && timestamp.interval_secs == 0 {
            return Err(EngineError::Config("timestamp.interval_secs must be > 0".into()));
        }
        Ok(Self {
            capacity: store.capacity,
            timestamp_interval: timestamp
                .enabled
                .then(|| Duration::from_secs(timestamp.interval_secs)),
            terminator,
        })
    }
}
