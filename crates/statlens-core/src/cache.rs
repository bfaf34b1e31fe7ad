//! In-memory caching for fetched statement bundles.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::{Granularity, StatementBundle, Ticker};

/// Defines how a single analysis interacts with the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise, fetch and write the bundle to the cache. (Default)
    #[default]
    Use,
    /// Always fetch, bypassing any cached entry, and write the new bundle.
    Refresh,
    /// Always fetch and do not read from or write to the cache.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Cache key: one entry per ticker and granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: Ticker,
    pub granularity: Granularity,
}

impl CacheKey {
    pub fn new(ticker: Ticker, granularity: Granularity) -> Self {
        Self {
            ticker,
            granularity,
        }
    }
}

/// Injectable cache of provider bundles. Purely a latency optimization:
/// entries may disappear at any time.
pub trait StatementCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<StatementBundle>;
    fn put(&self, key: CacheKey, bundle: StatementBundle);
    fn invalidate(&self, key: &CacheKey);
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bundle: StatementBundle,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now <= expires_at)
    }
}

/// Thread-safe TTL cache held in process memory.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    /// Create a new cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a cache with a default TTL of 5 minutes.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(300))
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove expired entries. Also runs on every `put`.
    pub fn clear_expired(&self) {
        let now = Instant::now();
        self.write().retain(|_, entry| entry.is_live(now));
    }

    // A panic while holding the lock leaves the map intact, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

impl StatementCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<StatementBundle> {
        let now = Instant::now();
        self.read()
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.bundle.clone())
    }

    fn put(&self, key: CacheKey, bundle: StatementBundle) {
        // Zero TTL disables the cache.
        if self.ttl == Duration::ZERO {
            return;
        }
        let now = Instant::now();
        let expires_at = now.checked_add(self.ttl);
        let mut entries = self.write();
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(key, CacheEntry { bundle, expires_at });
    }

    fn invalidate(&self, key: &CacheKey) {
        self.write().remove(key);
    }

    fn clear(&self) {
        self.write().clear();
    }
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl StatementCache for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<StatementBundle> {
        None
    }

    fn put(&self, _key: CacheKey, _bundle: StatementBundle) {}

    fn invalidate(&self, _key: &CacheKey) {}

    fn clear(&self) {}
}
