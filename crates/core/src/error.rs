//! Error type shared by the dataset store, cache and configuration loader.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the dataset layer.
///
/// Motion models and termination predicates are total and never produce one
/// of these; only file-backed operations do.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Underlying filesystem operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File length does not match the layout; never retried
    #[error("Dataset {} should be {expected} bytes (was {actual})", .path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// No primary dataset file in the scanned directory
    #[error("no dataset found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("forecast horizon must be a non-negative multiple of 3 hours, got {0}")]
    InvalidHorizon(u32),

    #[error("index {index:?} out of bounds for shape {shape:?}")]
    OutOfBounds { index: [usize; 5], shape: [usize; 5] },

    #[error("dataset {} is mapped read-only", .0.display())]
    ReadOnly(PathBuf),

    #[error("dataset {} has been closed", .0.display())]
    Closed(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DatasetError {
    /// Wrap an I/O error with the path it happened on
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate result alias
pub type Result<T> = std::result::Result<T, DatasetError>;
