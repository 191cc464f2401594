//! In-memory, fingerprint-keyed stage caches.
//!
//! A [`StageCache`] is shared by every run of a pipeline. Readers take a
//! read lock only; a miss computes outside any lock and then inserts, so
//! two runs racing on the same key both compute and the first insert
//! wins. Both results are equal, since stages are pure functions of their
//! fingerprinted input.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fingerprint::Fingerprint;

/// Whether a stage result was reused or computed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Cached,
    Computed,
}

/// Counters for one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug)]
pub struct StageCache<T> {
    entries: RwLock<HashMap<Fingerprint, Arc<T>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> Default for StageCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<T> StageCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key` without touching the counters.
    pub fn get(&self, key: &Fingerprint) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// Nothing is stored when `compute` fails, which includes cancellation.
    ///
    /// # Examples
    ///
    /// ```
    /// use optforge_codegen::cache::{CacheStatus, StageCache};
    /// use optforge_codegen::fingerprint::Fingerprint;
    ///
    /// let cache: StageCache<usize> = StageCache::new();
    /// let key = Fingerprint::of("input").unwrap();
    ///
    /// let (value, status) = cache.get_or_compute(&key, || Ok(42)).unwrap();
    /// assert_eq!((*value, status), (42, CacheStatus::Computed));
    ///
    /// let (value, status) = cache.get_or_compute(&key, || Ok(0)).unwrap();
    /// assert_eq!((*value, status), (42, CacheStatus::Cached));
    /// ```
    pub fn get_or_compute<F>(&self, key: &Fingerprint, compute: F) -> Result<(Arc<T>, CacheStatus)>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((value, CacheStatus::Cached));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(compute()?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let stored = entries.entry(key.clone()).or_insert(computed);
        Ok((Arc::clone(stored), CacheStatus::Computed))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry; counters are kept.
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
