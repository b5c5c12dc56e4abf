//! Bounded in-memory response store.
//!
//! Entries are evicted least-recently-used first once the summed body weight
//! exceeds `max_bytes`, and are treated as absent once older than `max_age`.
//! The store is not synchronized; the pipeline keeps it behind a mutex.

use std::time::{Duration, Instant};

use lru::LruCache;

use super::CacheEntry;
use crate::debug;

struct Stored {
    entry: CacheEntry,
    inserted: Instant,
}

/// Key → artifact map with size- and age-based eviction.
pub struct CacheStore {
    entries: LruCache<String, Stored>,
    weight: usize,
    max_bytes: usize,
    max_age: Duration,
}

impl CacheStore {
    pub fn new(max_bytes: usize, max_age: Duration) -> Self {
        Self {
            entries: LruCache::unbounded(),
            weight: 0,
            max_bytes,
            max_age,
        }
    }

    /// Look up a live entry, marking it most recently used.
    ///
    /// Expired entries are dropped and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        let expired = self.entries.peek(key)?.inserted.elapsed() > self.max_age;
        if expired {
            self.remove(key);
            debug!("cache"; "expired {}", key);
            return None;
        }
        self.entries.get(key).map(|stored| stored.entry.clone())
    }

    /// Insert or replace an entry, then evict down to the weight budget.
    ///
    /// An entry heavier than the whole budget is not stored. Returns whether
    /// the entry was stored.
    pub fn set(&mut self, key: impl Into<String>, entry: CacheEntry) -> bool {
        let key = key.into();
        let weight = entry.weight();

        if weight > self.max_bytes {
            self.remove(&key);
            debug!("cache"; "skipped {} ({} bytes over budget)", key, weight);
            return false;
        }

        let stored = Stored {
            entry,
            inserted: Instant::now(),
        };
        if let Some(old) = self.entries.put(key, stored) {
            self.weight -= old.entry.weight();
        }
        self.weight += weight;
        self.evict();
        true
    }

    /// Drop an entry.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let stored = self.entries.pop(key)?;
        self.weight -= stored.entry.weight();
        Some(stored.entry)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.weight = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Summed body weight of all entries.
    pub fn weight(&self) -> usize {
        self.weight
    }

    fn evict(&mut self) {
        while self.weight > self.max_bytes {
            let Some((key, stored)) = self.entries.pop_lru() else {
                break;
            };
            self.weight -= stored.entry.weight();
            debug!("cache"; "evicted {} ({} bytes)", key, stored.entry.weight());
        }
    }
}
