//! Process-wide cache of the most recent dataset
//!
//! The predictor opens the newest dataset for every request. Mapping a
//! multi-gigabyte file is cheap but not free, so the latest dataset is kept
//! in a single slot for a short time after each use. Expiry is checked
//! against a monotonic clock whenever the slot is consulted; an expired entry
//! is simply forgotten. Holders of the evicted [`Dataset`] keep a valid
//! mapping until they drop their `Arc`.

use super::scan::{scan, DatasetEntry};
use super::store::Dataset;
use crate::error::{DatasetError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How long a cached dataset survives without being requested
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Source of monotonic time for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Newest primary (empty suffix) dataset in `directory`
///
/// # Errors
/// - [`DatasetError::Io`] if the directory cannot be read
/// - [`DatasetError::NotFound`] if it holds no primary dataset
pub fn find_latest(directory: &Path) -> Result<DatasetEntry> {
    scan(directory, Some(&[""]))?
        .max_by_key(|entry| entry.forecast_time)
        .ok_or_else(|| DatasetError::NotFound(directory.to_path_buf()))
}

#[derive(Debug)]
struct CacheEntry {
    forecast_time: DateTime<Utc>,
    directory: PathBuf,
    dataset: Arc<Dataset>,
    expires: Instant,
}

/// Single-slot cache keyed by (forecast time, directory)
#[derive(Debug)]
pub struct LatestCache<C = MonotonicClock> {
    clock: C,
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl LatestCache<MonotonicClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(MonotonicClock, ttl)
    }

    /// The cache shared by the whole process
    pub fn global() -> &'static LatestCache {
        static GLOBAL: OnceLock<LatestCache> = OnceLock::new();
        GLOBAL.get_or_init(|| LatestCache::new(DEFAULT_TTL))
    }
}

impl Default for LatestCache<MonotonicClock> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<C: Clock> LatestCache<C> {
    pub fn with_clock(clock: C, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open the newest dataset in `directory`
    ///
    /// A live cache entry for the same forecast time and directory is reused.
    /// With `use_cache`, a hit pushes the expiry back to a full TTL from now,
    /// and a freshly opened dataset replaces whatever the slot held.
    ///
    /// # Errors
    /// - [`DatasetError::NotFound`] if the directory holds no dataset
    /// - any error from opening the dataset file
    pub fn latest(&self, directory: &Path, use_cache: bool) -> Result<Arc<Dataset>> {
        let newest = find_latest(directory)?;

        {
            let mut slot = self.slot.lock();
            let now = self.clock.now();
            Self::forget_expired(&mut slot, now);

            if let Some(entry) = slot.as_mut() {
                if entry.forecast_time == newest.forecast_time && entry.directory == directory {
                    if use_cache {
                        entry.expires = now + self.ttl;
                    }
                    debug!("Latest dataset cache hit for {}", entry.forecast_time);
                    return Ok(Arc::clone(&entry.dataset));
                }
            }
        }

        // Open without holding the lock
        let dataset = Arc::new(Dataset::open(&newest.forecast_time, directory)?);

        if use_cache {
            info!(
                "Caching latest dataset {} from {}",
                newest.forecast_time,
                directory.display()
            );
            *self.slot.lock() = Some(CacheEntry {
                forecast_time: newest.forecast_time,
                directory: directory.to_path_buf(),
                dataset: Arc::clone(&dataset),
                expires: self.clock.now() + self.ttl,
            });
        }

        Ok(dataset)
    }

    /// Forget the cached dataset if its expiry has passed. Returns whether an
    /// entry was dropped.
    pub fn prune(&self) -> bool {
        let mut slot = self.slot.lock();
        Self::forget_expired(&mut slot, self.clock.now())
    }

    /// Forget the cached dataset unconditionally
    pub fn clear(&self) {
        self.slot.lock().take();
    }

    /// Currently cached dataset, if any and still live
    pub fn cached(&self) -> Option<Arc<Dataset>> {
        let mut slot = self.slot.lock();
        Self::forget_expired(&mut slot, self.clock.now());
        slot.as_ref().map(|entry| Arc::clone(&entry.dataset))
    }

    fn forget_expired(slot: &mut Option<CacheEntry>, now: Instant) -> bool {
        if slot.as_ref().is_some_and(|entry| now >= entry.expires) {
            if let Some(entry) = slot.take() {
                debug!("Latest dataset cache entry {} expired", entry.forecast_time);
            }
            return true;
        }
        false
    }
}

/// Open the newest dataset in `directory` through the process-wide cache
///
/// # Errors
/// See [`LatestCache::latest`].
pub fn latest(directory: &Path, use_cache: bool) -> Result<Arc<Dataset>> {
    LatestCache::global().latest(directory, use_cache)
}
