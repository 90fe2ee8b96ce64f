//! In-memory extraction cache.
//!
//! Bounded, time-boxed memoization of successful extraction results,
//! keyed by URL + options. Avoids paying the remote service twice for
//! the same posting within a batch or across nearby requests. Entries
//! live for the process lifetime at most; there is no durable storage.

use indexmap::IndexMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::record::JobRecord;

struct CacheEntry {
    record: JobRecord,
    inserted_at: Instant,
}

struct Inner {
    // IndexMap keeps insertion order, which is the eviction order.
    entries: IndexMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Shared, mutable extraction cache. Reads and writes are serialized
/// behind a single mutex; contention is negligible next to the network
/// calls it saves.
pub struct ExtractionCache {
    inner: Mutex<Inner>,
    max_age: Duration,
    max_size: usize,
}

impl ExtractionCache {
    pub fn new(max_age: Duration, max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: IndexMap::new(),
                hits: 0,
                misses: 0,
            }),
            max_age,
            max_size,
        }
    }

    /// Look up a record. An entry older than `max_age` is never
    /// returned; it is evicted on this check (lazy expiry).
    pub fn get(&self, key: &str) -> Option<JobRecord> {
        let mut inner = self.inner.lock().unwrap();

        match inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.max_age => {
                let record = entry.record.clone();
                inner.hits += 1;
                Some(record)
            }
            Some(_) => {
                // shift_remove preserves insertion order for the rest
                inner.entries.shift_remove(key);
                inner.misses += 1;
                None
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a record, evicting the oldest-inserted entry first when
    /// at capacity (insertion-order eviction, not LRU-by-access).
    pub fn put(&self, key: impl Into<String>, record: JobRecord) {
        let key = key.into();
        let mut inner = self.inner.lock().unwrap();

        // Re-inserting a key refreshes its age and its eviction position.
        inner.entries.shift_remove(&key);

        while inner.entries.len() >= self.max_size.max(1) {
            inner.entries.shift_remove_index(0);
        }

        inner.entries.insert(
            key,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters for observability.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn record(title: &str) -> JobRecord {
        let mut record = JobRecord::empty(Platform::Generic);
        record.title = title.to_string();
        record
    }

    #[test]
    fn test_get_after_put() {
        let cache = ExtractionCache::new(Duration::from_secs(60), 10);
        cache.put("k1", record("Vaga A"));

        let found = cache.get("k1").unwrap();
        assert_eq!(found.title, "Vaga A");
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_missing_key_is_a_miss() {
        let cache = ExtractionCache::new(Duration::from_secs(60), 10);
        assert!(cache.get("nope").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        let cache = ExtractionCache::new(Duration::from_millis(20), 10);
        cache.put("k1", record("Vaga A"));

        std::thread::sleep(Duration::from_millis(40));

        assert!(cache.get("k1").is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_size_bound_evicts_oldest_inserted() {
        let cache = ExtractionCache::new(Duration::from_secs(60), 3);
        cache.put("k1", record("A"));
        cache.put("k2", record("B"));
        cache.put("k3", record("C"));
        cache.put("k4", record("D"));

        assert_eq!(cache.len(), 3);
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k4").is_some());
    }

    #[test]
    fn test_eviction_is_insertion_order_not_lru() {
        let cache = ExtractionCache::new(Duration::from_secs(60), 2);
        cache.put("k1", record("A"));
        cache.put("k2", record("B"));

        // Access k1 last; insertion-order eviction must still drop it.
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k1").is_some());

        cache.put("k3", record("C"));
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
    }

    #[test]
    fn test_reinsert_refreshes_position() {
        let cache = ExtractionCache::new(Duration::from_secs(60), 2);
        cache.put("k1", record("A"));
        cache.put("k2", record("B"));
        cache.put("k1", record("A2"));

        cache.put("k3", record("C"));

        // k2 became the oldest after k1 was re-inserted.
        assert!(cache.get("k2").is_none());
        assert_eq!(cache.get("k1").unwrap().title, "A2");
    }

    #[test]
    fn test_clear() {
        let cache = ExtractionCache::new(Duration::from_secs(60), 10);
        cache.put("k1", record("A"));
        cache.put("k2", record("B"));
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get("k1").is_none());
    }
}
