//! Shared key/value cache with per-entry expiry.
//!
//! The pipeline only needs the [`CacheStore`] contract; [`MemoryCache`] is the
//! in-process implementation backed by a `DashMap`, so reads are concurrent
//! and each write is atomic per key.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tracing::trace;

/// Default time-to-live for resolved media metadata.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

/// Writes between sweeps of expired entries.
pub const PURGE_INTERVAL: usize = 1024;

/// Concurrency-safe key/value store with TTL.
///
/// Absence is a normal answer: callers treat it as "resolve again".
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any existing entry.
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Stores `value` only if no live entry exists. Returns true if stored.
    fn add(&self, key: &str, value: Value, ttl: Duration) -> bool;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process [`CacheStore`].
///
/// Expired entries are evicted when read, and every [`PURGE_INTERVAL`]
/// writes a sweep drops the ones nobody asks for again, so a long-lived
/// process holds at most the live set plus one interval of dead entries.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    writes: AtomicUsize,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of stored entries, including ones that have expired but not
    /// been evicted yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        trace!(
            purged = before.saturating_sub(self.entries.len()),
            "expired cache entries purged"
        );
    }

    fn record_write(&self) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % PURGE_INTERVAL == 0 {
            self.purge_expired();
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            // Evict unless a concurrent writer refreshed it meanwhile.
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
            trace!(key, "cache entry expired");
        }
        None
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        self.record_write();
    }

    fn add(&self, key: &str, value: Value, ttl: Duration) -> bool {
        let stored = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(Instant::now()) {
                    false
                } else {
                    occupied.insert(CacheEntry::new(value, ttl));
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(value, ttl));
                true
            }
        };
        if stored {
            self.record_write();
        }
        stored
    }
}
