//! Result cache configuration.
//!
//! Controlled through the `[cache]` section of `mockup.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_CAPACITY: usize = 2048;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a rendered mockup URL stays valid.
    pub ttl: Duration,
    /// Maximum number of entries kept before least-recently-used eviction.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            capacity: settings.capacity.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
