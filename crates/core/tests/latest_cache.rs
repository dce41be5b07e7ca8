use chrono::{TimeZone, Utc};
use flight_predict_core::dataset::{Clock, LatestCache, DEFAULT_TTL};
use flight_predict_core::{Dataset, GridLayout};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Clock that only moves when told to
#[derive(Clone)]
struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Instant::now())))
    }

    fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("flight_predict_core=debug")
        .with_test_writer()
        .try_init();
}

/// Blank single-step datasets for each `YYYYMMDDHH` in `times`
fn populate(dir: &Path, times: &[(i32, u32, u32, u32)]) {
    for &(y, m, d, h) in times {
        let t = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();
        Dataset::create(&t, dir, GridLayout::new(0).unwrap()).unwrap();
    }
}

fn standard_directory() -> TempDir {
    let dir = TempDir::new().unwrap();
    populate(
        dir.path(),
        &[(2014, 2, 1, 0), (2014, 2, 1, 3), (2014, 1, 31, 18)],
    );
    dir
}

#[test]
fn test_selects_newest_forecast() {
    init_logging();
    let dir = standard_directory();
    let cache: LatestCache = LatestCache::default();

    let ds = cache.latest(dir.path(), true).unwrap();
    assert_eq!(ds.forecast_time(), Utc.with_ymd_and_hms(2014, 2, 1, 3, 0, 0).unwrap());
    assert_eq!(ds.directory(), dir.path());
}

#[test]
fn test_repeat_request_returns_same_instance() {
    init_logging();
    let dir = standard_directory();
    let cache: LatestCache = LatestCache::default();

    let first = cache.latest(dir.path(), true).unwrap();
    let second = cache.latest(dir.path(), true).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_without_caching_nothing_is_installed() {
    let dir = standard_directory();
    let cache: LatestCache = LatestCache::default();

    let first = cache.latest(dir.path(), false).unwrap();
    assert!(cache.cached().is_none());
    let second = cache.latest(dir.path(), false).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_expiry_forgets_entry_but_not_holders() {
    init_logging();
    let dir = standard_directory();
    let clock = ManualClock::new();
    let cache = LatestCache::with_clock(clock.clone(), DEFAULT_TTL);

    let first = cache.latest(dir.path(), true).unwrap();
    clock.advance(DEFAULT_TTL + Duration::from_secs(1));

    let second = cache.latest(dir.path(), true).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    // The evicted dataset is still mapped for whoever holds it
    assert!(first.is_open());
    assert_eq!(first.values().unwrap().len(), first.layout().element_count());

    // The fresh entry is cached again
    let third = cache.latest(dir.path(), true).unwrap();
    assert!(Arc::ptr_eq(&second, &third));
}

#[test]
fn test_hits_rearm_expiry() {
    let dir = standard_directory();
    let clock = ManualClock::new();
    let cache = LatestCache::with_clock(clock.clone(), Duration::from_secs(60));

    let first = cache.latest(dir.path(), true).unwrap();
    for _ in 0..5 {
        clock.advance(Duration::from_secs(40));
        let again = cache.latest(dir.path(), true).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    clock.advance(Duration::from_secs(61));
    assert!(cache.prune());
    assert!(cache.cached().is_none());
}

#[test]
fn test_uncached_hit_does_not_rearm() {
    let dir = standard_directory();
    let clock = ManualClock::new();
    let cache = LatestCache::with_clock(clock.clone(), Duration::from_secs(60));

    let first = cache.latest(dir.path(), true).unwrap();
    clock.advance(Duration::from_secs(40));
    let peek = cache.latest(dir.path(), false).unwrap();
    assert!(Arc::ptr_eq(&first, &peek));

    clock.advance(Duration::from_secs(30));
    assert!(cache.cached().is_none());
}

#[test]
fn test_directory_change_replaces_entry() {
    let one = standard_directory();
    let two = standard_directory();
    let cache: LatestCache = LatestCache::default();

    let first = cache.latest(one.path(), true).unwrap();
    let second = cache.latest(two.path(), true).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.directory(), two.path());

    let cached = cache.cached().unwrap();
    assert!(Arc::ptr_eq(&cached, &second));
}

#[test]
fn test_newer_forecast_replaces_entry() {
    let dir = standard_directory();
    let cache: LatestCache = LatestCache::default();

    let first = cache.latest(dir.path(), true).unwrap();
    populate(dir.path(), &[(2014, 2, 1, 6)]);

    let second = cache.latest(dir.path(), true).unwrap();
    assert_eq!(second.forecast_time(), Utc.with_ymd_and_hms(2014, 2, 1, 6, 0, 0).unwrap());
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_global_cache_is_shared() {
    let dir = standard_directory();
    let a = flight_predict_core::latest(dir.path(), true).unwrap();
    let b = LatestCache::global().latest(dir.path(), true).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    LatestCache::global().clear();
}
