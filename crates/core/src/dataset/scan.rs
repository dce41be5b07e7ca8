//! On-disk naming convention and directory listing
//!
//! A dataset lives at `directory/YYYYMMDDHH<suffix>`. The primary grid file
//! has an empty suffix; companion files (e.g. the GRIB mirror) share the
//! timestamp prefix. Nothing else identifies a dataset on disk.

use crate::error::{DatasetError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Format of the 10-character timestamp prefix
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H";

const TIMESTAMP_LEN: usize = 10;

/// Suffix of the companion "grib mirror" files
pub const SUFFIX_GRIBMIRROR: &str = ".gribmirror";

/// Path under which the dataset for `forecast_time` is expected
pub fn filename(forecast_time: &DateTime<Utc>, directory: &Path, suffix: &str) -> PathBuf {
    directory.join(format!("{}{}", forecast_time.format(TIMESTAMP_FORMAT), suffix))
}

/// Parse a `YYYYMMDDHH` prefix; `None` for anything else
pub fn parse_timestamp(prefix: &str) -> Option<DateTime<Utc>> {
    if prefix.len() != TIMESTAMP_LEN || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&prefix[..8], "%Y%m%d").ok()?;
    let hour: u32 = prefix[8..].parse().ok()?;
    Some(date.and_hms_opt(hour, 0, 0)?.and_utc())
}

/// One dataset file found by [`scan`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DatasetEntry {
    pub forecast_time: DateTime<Utc>,
    /// Filename remainder after the timestamp; empty for the primary grid
    pub suffix: String,
    pub filename: String,
    pub path: PathBuf,
}

/// Lazy iterator over the dataset files in a directory
///
/// Entries whose names do not start with a valid timestamp are skipped.
#[derive(Debug)]
pub struct Scan<'a> {
    directory: PathBuf,
    entries: ReadDir,
    only_suffixes: Option<&'a [&'a str]>,
}

impl Scan<'_> {
    fn entry_for(&self, name: &str) -> Option<DatasetEntry> {
        let prefix = name.get(..TIMESTAMP_LEN)?;
        let forecast_time = parse_timestamp(prefix)?;
        let suffix = &name[TIMESTAMP_LEN..];

        if let Some(only) = self.only_suffixes {
            if !only.contains(&suffix) {
                return None;
            }
        }

        Some(DatasetEntry {
            forecast_time,
            suffix: suffix.to_string(),
            filename: name.to_string(),
            path: self.directory.join(name),
        })
    }
}

impl Iterator for Scan<'_> {
    type Item = DatasetEntry;

    fn next(&mut self) -> Option<DatasetEntry> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.directory.display(), e);
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(found) = self.entry_for(name) {
                return Some(found);
            }
        }
    }
}

/// Scan `directory` for datasets
///
/// With `only_suffixes`, entries whose suffix is not listed are dropped
/// (`Some(&[""])` yields primary grid files only). Every call re-reads the
/// directory.
///
/// # Errors
/// Returns [`DatasetError::Io`] if the directory cannot be read.
pub fn scan<'a>(directory: &Path, only_suffixes: Option<&'a [&'a str]>) -> Result<Scan<'a>> {
    let entries = fs::read_dir(directory).map_err(|e| DatasetError::io(directory, e))?;
    Ok(Scan {
        directory: directory.to_path_buf(),
        entries,
        only_suffixes,
    })
}
