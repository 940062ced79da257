//! Memoisation of strategy outcomes.
//!
//! Entries are keyed by the rounded source, the rounded destination and the
//! algorithm. Once written an entry is never replaced while it is live: the
//! first writer wins and every later insert for the key returns the stored
//! value. Eviction is delegated to an injected [`EvictionPolicy`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace};

use crate::geo::Coordinate;
use crate::routing::{RouteAlgorithm, StrategyResult};

/// Default number of decimal places kept in cache keys (about 0.1 m).
pub const DEFAULT_PRECISION: u32 = 6;

/// Smallest supported key precision (about 1 m).
pub const MIN_PRECISION: u32 = 5;

/// Largest supported key precision; keeps scaled coordinates well inside i64.
pub const MAX_PRECISION: u32 = 9;

/// Coordinate scaled by `10^precision` and rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridPoint {
    pub lat: i64,
    pub lon: i64,
}

impl GridPoint {
    pub fn from_coordinate(coordinate: Coordinate, precision: u32) -> Self {
        let scale = 10f64.powi(precision.min(MAX_PRECISION) as i32);
        Self {
            lat: (coordinate.lat * scale).round() as i64,
            lon: (coordinate.lon * scale).round() as i64,
        }
    }
}

/// Cache key for one strategy outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub source: GridPoint,
    pub destination: GridPoint,
    pub algorithm: RouteAlgorithm,
}

/// Bookkeeping an eviction policy may inspect.
#[derive(Debug, Clone, Copy)]
pub struct EntryStats {
    pub written_at: Instant,
    /// Monotonic access tick; larger means more recently used.
    pub last_access: u64,
}

/// Decides which entries leave the cache.
pub trait EvictionPolicy: Send + Sync + fmt::Debug {
    /// Stale entries are treated as misses and may be overwritten.
    fn is_expired(&self, entry: &EntryStats, now: Instant) -> bool {
        let _ = (entry, now);
        false
    }

    /// Maximum number of live entries, if bounded.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Keep everything for the lifetime of the cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {}

/// Keep at most `capacity` entries, dropping the least recently used.
#[derive(Debug, Clone, Copy)]
pub struct LeastRecentlyUsed {
    pub capacity: usize,
}

impl EvictionPolicy for LeastRecentlyUsed {
    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }
}

/// Expire entries `ttl` after they were written.
#[derive(Debug, Clone, Copy)]
pub struct TimeToLive {
    pub ttl: Duration,
}

impl EvictionPolicy for TimeToLive {
    fn is_expired(&self, entry: &EntryStats, now: Instant) -> bool {
        now.saturating_duration_since(entry.written_at) >= self.ttl
    }
}

#[derive(Debug)]
struct CacheEntry {
    result: StrategyResult,
    written_at: Instant,
    last_access: AtomicU64,
}

impl CacheEntry {
    fn stats(&self) -> EntryStats {
        EntryStats {
            written_at: self.written_at,
            last_access: self.last_access.load(Ordering::Relaxed),
        }
    }
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe memo of strategy outcomes.
#[derive(Debug)]
pub struct ResultCache {
    precision: u32,
    policy: Box<dyn EvictionPolicy>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION, Box::new(Unbounded))
    }
}

impl ResultCache {
    /// Precision is clamped to `MIN_PRECISION..=MAX_PRECISION`.
    pub fn new(precision: u32, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            precision: precision.clamp(MIN_PRECISION, MAX_PRECISION),
            policy,
            entries: RwLock::new(HashMap::new()),
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Key for a query at this cache's precision.
    pub fn key(
        &self,
        source: Coordinate,
        destination: Coordinate,
        algorithm: RouteAlgorithm,
    ) -> CacheKey {
        CacheKey {
            source: GridPoint::from_coordinate(source, self.precision),
            destination: GridPoint::from_coordinate(destination, self.precision),
            algorithm,
        }
    }

    /// Live entry for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<StrategyResult> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if !self.policy.is_expired(&entry.stats(), now) => {
                entry.last_access.store(self.next_tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(?key, "result cache hit");
                Some(entry.result.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `result` unless a live entry exists, returning the stored value.
    pub fn insert(&self, key: CacheKey, result: StrategyResult) -> StrategyResult {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some(existing) = entries.get(&key) {
            if !self.policy.is_expired(&existing.stats(), now) {
                return existing.result.clone();
            }
        }

        entries.insert(
            key,
            CacheEntry {
                result: result.clone(),
                written_at: now,
                last_access: AtomicU64::new(self.next_tick()),
            },
        );
        self.evict(&mut entries, now);
        result
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn evict(&self, entries: &mut HashMap<CacheKey, CacheEntry>, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| !self.policy.is_expired(&entry.stats(), now));

        if let Some(capacity) = self.policy.capacity() {
            while entries.len() > capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_access.load(Ordering::Relaxed))
                    .map(|(key, _)| *key);
                match oldest {
                    Some(key) => {
                        entries.remove(&key);
                    }
                    None => break,
                }
            }
        }

        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "evicted cache entries");
        }
    }
}
