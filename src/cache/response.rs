use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Vec<u8>,
    pub content_type: String,
    pub inserted_at: Instant,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(body: Vec<u8>, content_type: String, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            body,
            content_type,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.inserted_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entry_count: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub total_bytes: usize,
}

/// Upstream payloads keyed by the resolved upstream URL.
///
/// Expired entries are dropped lazily on lookup and by [`ResponseCache::purge_expired`].
/// A zero TTL disables the cache: stores are ignored and every lookup misses.
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write();
            // another writer may have refreshed it in between
            if entries.get(key).map_or(false, CacheEntry::is_expired) {
                entries.remove(key);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: &str, body: Vec<u8>, content_type: String) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), CacheEntry::new(body, content_type, self.ttl));
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let live = entries.values().filter(|entry| !entry.is_expired());
        let (entry_count, total_bytes) =
            live.fold((0, 0), |(count, bytes), entry| (count + 1, bytes + entry.body.len()));

        CacheStats {
            entry_count,
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            total_bytes,
        }
    }
}
