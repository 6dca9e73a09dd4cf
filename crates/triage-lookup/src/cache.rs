//! Caching layer for external lookups
//!
//! Time-bounded memoization over the lookup service, so a batch run
//! does not hammer the backing spreadsheet store with one read per
//! hostname. Expired entries are treated as absent on read and stay in
//! storage until the next successful `put` overwrites them; there is
//! no eviction beyond TTL. Unbounded growth is accepted for the scope
//! of a single process run.
//!
//! The clock is injected so TTL behavior can be verified with a fake
//! clock in tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use triage_core::{CacheConfig, ContactLookupResult, HostnameLookupResult};

// ============================================================================
// Clock
// ============================================================================

/// Source of monotonic time for TTL checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ============================================================================
// TTL Cache
// ============================================================================

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// A TTL-bounded key-value cache
///
/// `get` returns absent if no entry exists, the cache is disabled, or
/// the stored entry's age has reached the TTL. Thread-safe; cloning
/// shares the underlying storage.
#[derive(Clone)]
pub struct TtlCache<V> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<V>>>>,
    ttl: Duration,
    enabled: bool,
    clock: Arc<dyn Clock>,
    stats: Arc<CacheStats>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache from configuration, using the system clock
    pub fn with_config(name: &str, config: &CacheConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit clock (tests use a manual one)
    pub fn with_clock(name: &str, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::from_secs(config.ttl_seconds),
            enabled: config.enabled,
            clock,
            stats: Arc::new(CacheStats::new(name)),
        }
    }

    /// Get a value; a stale entry is a miss and is left in place
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if self.clock.now().duration_since(entry.inserted_at) < self.ttl => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Store a value, overwriting any previous entry (stale or not)
    pub fn put(&self, key: &str, value: V) {
        if !self.enabled {
            return;
        }

        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: self.clock.now(),
            },
        );
        self.stats.record_write();
    }

    /// Number of stored entries, stale ones included
    pub fn entry_count(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }
}

// ============================================================================
// Cache Statistics
// ============================================================================

/// Statistics for cache performance monitoring
#[derive(Debug)]
pub struct CacheStats {
    name: String,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheStats {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Hit rate in [0.0, 1.0]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Get a summary report
    pub fn report(&self) -> CacheStatsReport {
        CacheStatsReport {
            name: self.name.clone(),
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            total_requests: self.total_requests(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// Serializable cache statistics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub total_requests: u64,
    pub hit_rate: f64,
}

// ============================================================================
// Cache Manager
// ============================================================================

/// Process-lifetime caches for both lookup kinds
///
/// Constructed once per process and passed to the resolvers. The two
/// kinds live in separate caches and additionally carry `group:` /
/// `contact:` key prefixes, so collisions across resolvers are
/// impossible.
#[derive(Clone)]
pub struct LookupCaches {
    /// hostname -> support group results
    pub group: TtlCache<HostnameLookupResult>,
    /// support group -> contact results
    pub contact: TtlCache<ContactLookupResult>,
}

impl LookupCaches {
    /// Create both caches from configuration, using the system clock
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            group: TtlCache::with_config("group", config),
            contact: TtlCache::with_config("contact", config),
        }
    }

    /// Create both caches with an explicit clock
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            group: TtlCache::with_clock("group", config, Arc::clone(&clock)),
            contact: TtlCache::with_clock("contact", config, clock),
        }
    }

    /// Combined statistics for both caches
    pub fn all_stats(&self) -> Vec<CacheStatsReport> {
        vec![self.group.stats().report(), self.contact.stats().report()]
    }
}

// ============================================================================
// Tests
// ============================================================================
