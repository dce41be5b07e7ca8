//! Wind dataset storage
//!
//! Grid layout, on-disk naming, memory-mapped access and the latest-dataset
//! cache.

pub mod cache;
pub mod layout;
pub mod scan;
pub mod store;

// Re-export main types
pub use cache::{find_latest, latest, Clock, LatestCache, MonotonicClock, DEFAULT_TTL};
pub use layout::{Axes, GridLayout, Variable, DEFAULT_FORECAST_HOURS};
pub use scan::{filename, parse_timestamp, scan, DatasetEntry, Scan, SUFFIX_GRIBMIRROR};
pub use store::{Dataset, OpenOptions, DEFAULT_DIRECTORY};
