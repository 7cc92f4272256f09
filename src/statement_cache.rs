//! Memoization of scanner output keyed by exact SQL text.
//!
//! Scanning is pure, so cached entries never need invalidation. Entries are
//! evicted least-recently-used first once the cache is full.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;

use crate::scanner::{scan, StatementInfo};

/// LRU cache of [`StatementInfo`] by SQL text.
#[derive(Debug)]
pub struct StatementCache {
    /// Insertion order doubles as recency order: the last entry is the newest.
    cache: IndexMap<String, Arc<StatementInfo>>,
    /// Maximum number of entries (0 disables caching).
    max_size: usize,
}

impl StatementCache {
    /// Create a cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: IndexMap::with_capacity(max_size),
            max_size,
        }
    }

    /// Return the scan for `sql`, scanning on a miss.
    pub fn get_or_scan(&mut self, sql: &str) -> Arc<StatementInfo> {
        if let Some(index) = self.cache.get_index_of(sql) {
            let last = self.cache.len() - 1;
            self.cache.move_index(index, last);
            trace!(sql_len = sql.len(), "statement cache hit");
            return Arc::clone(&self.cache[last]);
        }

        let info = Arc::new(scan(sql));
        if self.max_size == 0 {
            return info;
        }
        if self.cache.len() >= self.max_size {
            if let Some((evicted, _)) = self.cache.shift_remove_index(0) {
                trace!(evicted_len = evicted.len(), "statement cache evict");
            }
        }
        trace!(sql_len = sql.len(), binds = info.bind_names.len(), "statement cache miss");
        self.cache.insert(sql.to_string(), Arc::clone(&info));
        info
    }

    pub fn contains(&self, sql: &str) -> bool {
        self.cache.contains_key(sql)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_returns_same_scan() {
        let mut cache = StatementCache::new(2);
        let first = cache.get_or_scan("select :a from dual");
        let second = cache.get_or_scan("select :a from dual");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = StatementCache::new(2);
        cache.get_or_scan("select 1 from dual");
        cache.get_or_scan("select 2 from dual");
        // Touch the first so the second becomes least recently used.
        cache.get_or_scan("select 1 from dual");
        cache.get_or_scan("select 3 from dual");

        assert!(cache.contains("select 1 from dual"));
        assert!(!cache.contains("select 2 from dual"));
        assert!(cache.contains("select 3 from dual"));
    }

    #[test]
    fn test_exact_text_keys() {
        let mut cache = StatementCache::new(4);
        cache.get_or_scan("select :a from dual");
        cache.get_or_scan("SELECT :a FROM dual");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_disabled_cache() {
        let mut cache = StatementCache::new(0);
        let info = cache.get_or_scan("select :a from dual");
        assert_eq!(info.bind_names, vec!["A"]);
        assert!(cache.is_empty());
    }
}
