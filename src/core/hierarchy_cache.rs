// src/core/hierarchy_cache.rs

//! # Hierarchy Cache
//!
//! Keeps recently built menu hierarchies per application. Entries expire after a fixed TTL
//! and the least recently used application is evicted when the cache is full.
//!
//! The whole cache state lives behind one mutex and every operation holds the lock from the
//! first map lookup to the last recency update, so concurrent callers always observe the
//! maps and the recency order in agreement.

use crate::constants::{DEFAULT_HIERARCHY_CACHE_CAPACITY, DEFAULT_HIERARCHY_TTL_SECS};
use crate::core::recency::RecencyList;
use crate::models::{MenuHierarchy, expiry_after};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

/// Counters describing how the cache has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatistics {
    /// Number of entries currently stored.
    pub entries: usize,
    /// Lookups that returned a live entry.
    pub hits: u64,
    /// Every unsuccessful lookup, including those that found an expired entry.
    pub misses: u64,
    /// Cumulative number of entries dropped because their TTL had passed.
    /// Survives `invalidate_all` for diagnostics.
    pub expired: u64,
}

impl CacheStatistics {
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, Arc<MenuHierarchy>>,
    recency: RecencyList<String>,
    hits: u64,
    misses: u64,
    expired: u64,
}

/// TTL- and capacity-bounded LRU cache of menu hierarchies keyed by application id.
#[derive(Debug)]
pub struct HierarchyCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Duration,
}

impl Default for HierarchyCache {
    fn default() -> Self {
        Self::new(
            DEFAULT_HIERARCHY_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_HIERARCHY_TTL_SECS),
        )
    }
}

impl HierarchyCache {
    /// Creates an empty cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: RecencyList::new(),
                hits: 0,
                misses: 0,
                expired: 0,
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How long an entry stays valid after `put`.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave the maps half-updated in a way later
    // operations would trip over, so a poisoned lock is simply taken over.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached hierarchy for `key` if it is still valid.
    pub fn get(&self, key: &str) -> Option<Arc<MenuHierarchy>> {
        self.get_at(key, SystemTime::now())
    }

    /// [`get`](Self::get) evaluated at an explicit point in time.
    pub fn get_at(&self, key: &str, now: SystemTime) -> Option<Arc<MenuHierarchy>> {
        let mut state = self.lock();

        let valid = match state.entries.get(key) {
            None => {
                state.misses += 1;
                log::trace!("Hierarchy cache miss for '{}'.", key);
                return None;
            }
            Some(entry) => entry.is_valid_at(now),
        };

        if !valid {
            state.entries.remove(key);
            state.recency.remove(&key.to_string());
            state.misses += 1;
            state.expired += 1;
            log::debug!("Hierarchy for '{}' expired; evicted on lookup.", key);
            return None;
        }

        state.hits += 1;
        state.recency.touch(&key.to_string());
        state.entries.get(key).cloned()
    }

    /// Stores `hierarchy` for `key`, expiring `ttl` from now.
    pub fn put(&self, key: &str, hierarchy: MenuHierarchy) {
        self.put_at(key, hierarchy, SystemTime::now());
    }

    /// [`put`](Self::put) evaluated at an explicit point in time.
    pub fn put_at(&self, key: &str, hierarchy: MenuHierarchy, now: SystemTime) {
        let entry = Arc::new(hierarchy.with_expiry(expiry_after(now, self.ttl)));
        let key = key.to_string();
        let mut state = self.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            if let Some(evicted) = state.recency.pop_lru() {
                state.entries.remove(&evicted);
                log::debug!("Hierarchy cache full; evicted least recently used '{}'.", evicted);
            }
        }

        state.entries.insert(key.clone(), entry);
        state.recency.touch(&key);
    }

    /// Drops the entry for `key`. Returns whether there was one.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.lock();
        state.recency.remove(&key.to_string());
        state.entries.remove(key).is_some()
    }

    /// Drops every entry and resets hit/miss counters. The expired counter is kept.
    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.recency.clear();
        state.hits = 0;
        state.misses = 0;
        log::debug!("Hierarchy cache cleared.");
    }

    /// Evicts every expired entry now. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(SystemTime::now())
    }

    /// [`cleanup`](Self::cleanup) evaluated at an explicit point in time.
    pub fn cleanup_at(&self, now: SystemTime) -> usize {
        let mut state = self.lock();
        let stale: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            state.entries.remove(key);
            state.recency.remove(key);
        }
        state.expired += stale.len() as u64;
        if !stale.is_empty() {
            log::debug!("Hierarchy cache cleanup evicted {} expired entries.", stale.len());
        }
        stale.len()
    }

    /// Snapshot of the current counters.
    pub fn statistics(&self) -> CacheStatistics {
        let state = self.lock();
        CacheStatistics {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            expired: state.expired,
        }
    }

    /// Cached application ids from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lock().recency.iter_mru().cloned().collect()
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
