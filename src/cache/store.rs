//! Rendered mockup result storage.
//!
//! The store is an optimisation only: losing entries causes a re-render, never
//! an incorrect result.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";
const METRIC_CACHE_HIT: &str = "mockup_cache_hit_total";
const METRIC_CACHE_MISS: &str = "mockup_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "mockup_cache_evict_total";

/// Completed render result with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub asset_url: String,
    pub expires_at: OffsetDateTime,
}

/// Store for completed mockup URLs keyed by [`super::generate_key`].
pub trait ResultCache: Send + Sync {
    /// Returns the URL only while the entry has not expired.
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, asset_url: &str);
    fn invalidate(&self, key: &str);
}

/// In-process LRU store with per-entry expiry.
pub struct MemoryResultCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = Mutex::new(LruCache::new(config.capacity_non_zero()));
        Self {
            config,
            clock,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "purge_expired");
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }
}

impl ResultCache for MemoryResultCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let hit = match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.asset_url.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        };
        drop(entries);

        if hit.is_some() {
            counter!(METRIC_CACHE_HIT).increment(1);
        } else {
            counter!(METRIC_CACHE_MISS).increment(1);
        }
        hit
    }

    fn put(&self, key: &str, asset_url: &str) {
        let entry = CacheEntry {
            asset_url: asset_url.to_string(),
            expires_at: expiry_after(self.clock.now(), self.config.ttl),
        };
        let evicted = mutex_lock(&self.entries, SOURCE, "put").push(key.to_string(), entry);
        if matches!(evicted, Some((evicted_key, _)) if evicted_key != key) {
            counter!(METRIC_CACHE_EVICT).increment(1);
        }
    }

    fn invalidate(&self, key: &str) {
        mutex_lock(&self.entries, SOURCE, "invalidate").pop(key);
    }
}

/// Saturates at the latest representable instant instead of overflowing.
fn expiry_after(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
    time::Duration::try_from(ttl)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::datetime;

    use super::super::clock::manual::ManualClock;
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn cache_with_clock(capacity: usize) -> (MemoryResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(datetime!(2026-03-01 12:00 UTC)));
        let config = CacheConfig {
            capacity,
            ..Default::default()
        };
        (MemoryResultCache::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn hit_just_before_ttl() {
        let (cache, clock) = cache_with_clock(16);
        cache.put("k", "https://cdn.example/a.png");

        clock.advance(6 * DAY + 23 * HOUR);
        assert_eq!(cache.get("k").as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn miss_just_after_ttl() {
        let (cache, clock) = cache_with_clock(16);
        cache.put("k", "https://cdn.example/a.png");

        clock.advance(7 * DAY + HOUR);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry should be dropped on read");
    }

    #[test]
    fn absent_and_expired_are_both_misses() {
        let (cache, _clock) = cache_with_clock(16);
        assert_eq!(cache.get("never-written"), None);
    }

    #[test]
    fn put_refreshes_expiry() {
        let (cache, clock) = cache_with_clock(16);
        cache.put("k", "https://cdn.example/old.png");
        clock.advance(5 * DAY);
        cache.put("k", "https://cdn.example/new.png");
        clock.advance(5 * DAY);
        assert_eq!(cache.get("k").as_deref(), Some("https://cdn.example/new.png"));
    }

    #[test]
    fn invalidate_removes_entry() {
        let (cache, _clock) = cache_with_clock(16);
        cache.put("k", "https://cdn.example/a.png");
        cache.invalidate("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn lru_eviction_respects_capacity() {
        let (cache, _clock) = cache_with_clock(2);
        cache.put("a", "https://cdn.example/a.png");
        cache.put("b", "https://cdn.example/b.png");
        assert!(cache.get("a").is_some());
        cache.put("c", "https://cdn.example/c.png");

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none(), "least recently used entry evicted");
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn purge_expired_drops_only_stale_entries() {
        let (cache, clock) = cache_with_clock(16);
        cache.put("old", "https://cdn.example/old.png");
        clock.advance(4 * DAY);
        cache.put("fresh", "https://cdn.example/fresh.png");
        clock.advance(4 * DAY);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
    }

    #[test]
    fn oversized_ttl_saturates_instead_of_overflowing() {
        let clock = Arc::new(ManualClock::new(datetime!(2026-03-01 12:00 UTC)));
        let config = CacheConfig {
            ttl: Duration::from_secs(400_000_000_000),
            ..Default::default()
        };
        let cache = MemoryResultCache::with_clock(config, clock.clone());

        cache.put("k", "https://cdn.example/a.png");
        clock.advance(3650 * DAY);
        assert_eq!(cache.get("k").as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let (cache, _clock) = cache_with_clock(16);
        let cache = Arc::new(cache);
        let poisoner = Arc::clone(&cache);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().expect("lock");
            panic!("poison the cache lock");
        })
        .join();

        cache.put("k", "https://cdn.example/a.png");
        assert!(cache.get("k").is_some());
    }
}
