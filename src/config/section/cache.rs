//! `[cache]` section configuration.
//!
//! Bounds for the in-memory response cache.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! max_bytes = 100_000_000   # Total body weight before LRU eviction
//! max_age_ms = 86_400_000   # Entries older than this are treated as absent
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cumulative body size in bytes.
    pub max_bytes: usize,

    /// Maximum entry age in milliseconds.
    pub max_age_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100_000_000,
            max_age_ms: 86_400_000,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}
