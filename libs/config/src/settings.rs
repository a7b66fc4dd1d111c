//! Settings sections and their defaults
//!
//! Each section deserializes with `#[serde(default)]` so a config file only
//! has to name the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default code-space partition; also selects the 12-digit format
pub const DEFAULT_KIND: &str = "uac";

/// Upper bound on units in flight for any batch operation
pub const DEFAULT_MAX_CONCURRENT: usize = 500;

/// Collision retries before the allocator gives up on a case
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Milliseconds a snapshot write waits after the first unsaved mutation
pub const DEFAULT_SNAPSHOT_DELAY_MS: u64 = 100;

/// Code generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Code-space partition name ("uac" or "uac16")
    pub kind: String,

    /// Maximum concurrently running units per batch call
    pub max_concurrent: usize,

    /// Maximum insert attempts per case before reporting exhaustion
    pub max_attempts: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            kind: DEFAULT_KIND.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl GeneratorSettings {
    /// Settings for a given kind with default bounds
    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Override the worker pool bound
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Override the collision retry bound
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Backing store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory for the JSON snapshot; in-memory only when unset
    pub snapshot_dir: Option<PathBuf>,

    /// Debounce before a background snapshot write
    pub snapshot_delay_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            snapshot_delay_ms: DEFAULT_SNAPSHOT_DELAY_MS,
        }
    }
}

impl StoreSettings {
    pub fn snapshot_delay(&self) -> Duration {
        Duration::from_millis(self.snapshot_delay_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
