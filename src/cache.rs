//! Bounded in-memory memoization for assessments and extractions.
//!
//! Key properties:
//! - Entries are immutable values behind an `Arc`; a hit hands out a clone of the pointer
//! - Capacity is fixed; an insert over capacity evicts exactly one entry, the least recently used
//! - Reads share the lock and bump an atomic recency stamp; writes take the lock exclusively
//! - A poisoned lock is logged and treated as a miss

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::monograph::DosageExtraction;
use crate::report::AssessmentReport;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    #[error("Internal lock failed")]
    LockFailed,
}

// ═══════════════════════════════════════════════════════════
// Slot: one cached value with its recency stamp
// ═══════════════════════════════════════════════════════════

struct Slot<V> {
    value: Arc<V>,
    last_used: AtomicU64,
}

// ═══════════════════════════════════════════════════════════
// BoundedCache
// ═══════════════════════════════════════════════════════════

/// Fingerprint-keyed LRU cache.
pub struct BoundedCache<V> {
    name: &'static str,
    capacity: usize,
    entries: RwLock<HashMap<String, Slot<V>>>,
    clock: AtomicU64,
}

/// Full assessment reports keyed by assessment fingerprint.
pub type ResultCache = BoundedCache<AssessmentReport>;

/// Dosage extractions keyed by monograph fingerprint.
pub type ExtractionCache = BoundedCache<DosageExtraction>;

impl<V> BoundedCache<V> {
    /// Create an empty cache. A capacity of zero stores nothing.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a value and mark it as most recently used.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(_) => {
                tracing::warn!(cache = self.name, "Cache lock poisoned, treating as miss");
                return None;
            }
        };
        let slot = entries.get(key)?;
        slot.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&slot.value))
    }

    /// Store a value. Returns the key evicted to make room, if any.
    pub fn insert(&self, key: String, value: Arc<V>) -> Result<Option<String>, CacheError> {
        if self.capacity == 0 {
            return Ok(None);
        }
        let stamp = self.tick();
        let mut entries = self.entries.write().map_err(|_| CacheError::LockFailed)?;

        let mut evicted = None;
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        entries.insert(
            key,
            Slot {
                value,
                last_used: AtomicU64::new(stamp),
            },
        );
        Ok(evicted)
    }

    /// Number of cached entries (zero if the lock is poisoned).
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    /// Drop every entry.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.entries
            .write()
            .map_err(|_| CacheError::LockFailed)?
            .clear();
        Ok(())
    }
}
