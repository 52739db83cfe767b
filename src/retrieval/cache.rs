use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;
use crate::core::types::DocId;

/// (document, count) pairs recorded for one key, ordered by document
pub type Occurrences = Arc<Vec<(DocId, u32)>>;

/// Session-scoped cache of per-key occurrences filled by onepass and
/// sampled statistics passes.
///
/// Each pass builds its entry privately and publishes it in one step on
/// success; a later pass over the same key replaces the entry.
pub struct OccurrenceCache {
    entries: RwLock<HashMap<String, Occurrences>>,
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
}

impl OccurrenceCache {
    pub fn new() -> Self {
        OccurrenceCache {
            entries: RwLock::new(HashMap::new()),
            hit_count: AtomicUsize::new(0),
            miss_count: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Occurrences> {
        let entries = self.entries.read();
        if let Some(occurrences) = entries.get(key) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            Some(Arc::clone(occurrences))
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Count cached for `doc` under `key`, if that pass saw it
    pub fn count(&self, key: &str, doc: DocId) -> Option<u32> {
        let occurrences = self.get(key)?;
        occurrences
            .binary_search_by_key(&doc, |(d, _)| *d)
            .ok()
            .map(|i| occurrences[i].1)
    }

    pub fn publish(&self, key: impl Into<String>, occurrences: Vec<(DocId, u32)>) {
        self.entries.write().insert(key.into(), Arc::new(occurrences));
    }

    pub fn remove(&self, key: &str) -> Option<Occurrences> {
        self.entries.write().remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

impl Default for OccurrenceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hit_count: usize,
    pub miss_count: usize,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_publish_replaces_entry() {
        let cache = OccurrenceCache::new();
        cache.publish("a", vec![(DocId(1), 2), (DocId(5), 1)]);
        cache.publish("a", vec![(DocId(9), 4)]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.count("a", DocId(9)), Some(4));
        assert_eq!(cache.count("a", DocId(1)), None);
    }

    #[test]
    fn tracks_hits_and_misses() {
        let cache = OccurrenceCache::new();
        cache.publish("a", vec![(DocId(1), 2)]);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
