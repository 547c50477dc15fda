//! In-memory fetch cache keyed by `(symbol, start, end)`.
//!
//! Each key owns its own slot mutex, held across the underlying fetch, so
//! concurrent callers for one key wait for a single fetch while other keys
//! proceed. Expiry is checked lazily on lookup against an injected [`Clock`].
//! Empty results and failures are never stored, and their slots are
//! released once no other caller waits on them.

use super::clock::{Clock, SystemClock};
use super::normalize::normalize;
use super::provider::{DataError, DataProvider};
use super::raw::RawFrame;
use crate::domain::Series;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub series: Arc<Series>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct FetchCache<C: Clock = SystemClock> {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    ttl: Duration,
    clock: C,
    hits: AtomicU64,
    misses: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FetchCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl Default for FetchCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FetchCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live series for the key, or run `fetch` once, normalize its
    /// frame, restrict it to `[start, end]` and store it.
    pub fn get_or_fetch<F>(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        fetch: F,
    ) -> Result<Arc<Series>, DataError>
    where
        F: FnOnce(&str, NaiveDate, NaiveDate) -> Result<RawFrame, DataError>,
    {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }

        let key = CacheKey::new(symbol, start, end);
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let mut entry = lock(&slot);

        if let Some(cached) = entry.as_ref() {
            if cached.is_live(self.clock.now(), self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(symbol, %start, %end, "fetch cache hit");
                return Ok(Arc::clone(&cached.series));
            }
            debug!(symbol, %start, %end, "fetch cache entry expired");
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let fetched = fetch(symbol, start, end)
            .and_then(|raw| normalize(symbol, &raw))
            .map(|series| Arc::new(series.within(start, end)));

        match fetched {
            Ok(series) if !series.is_empty() => {
                info!(symbol, %start, %end, rows = series.len(), "fetched series");
                *entry = Some(CacheEntry {
                    series: Arc::clone(&series),
                    fetched_at: self.clock.now(),
                });
                Ok(series)
            }
            result => {
                if result.is_ok() {
                    info!(symbol, %start, %end, "provider returned no rows; not cached");
                }
                *entry = None;
                drop(entry);
                self.release(&key, &slot);
                result
            }
        }
    }

    /// Remove the key's empty slot unless another caller still holds it.
    fn release(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = lock(&self.slots);
        let ours = slots.get(key).is_some_and(|held| Arc::ptr_eq(held, slot));
        // One reference in the map, one in this caller.
        if ours && Arc::strong_count(slot) == 2 && lock(slot).is_none() {
            slots.remove(key);
        }
    }

    pub fn get_or_fetch_from(
        &self,
        provider: &dyn DataProvider,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<Series>, DataError> {
        self.get_or_fetch(symbol, start, end, |s, a, b| provider.fetch(s, a, b))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Live entries only. Expired slots nobody else holds are dropped.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let slots: Vec<Slot> = {
            let mut slots = lock(&self.slots);
            slots.retain(|_, slot| {
                Arc::strong_count(slot) > 1
                    || lock(slot)
                        .as_ref()
                        .is_some_and(|entry| entry.is_live(now, self.ttl))
            });
            slots.values().cloned().collect()
        };
        slots
            .iter()
            .filter(|slot| {
                lock(slot)
                    .as_ref()
                    .is_some_and(|entry| entry.is_live(now, self.ttl))
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        lock(&self.slots).len()
    }
}
