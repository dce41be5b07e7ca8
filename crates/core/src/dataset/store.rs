//! Memory-mapped wind datasets
//!
//! Datasets downloaded from the NOAA are stored as large headerless binary
//! files which are mapped into the predictor process and treated as one huge
//! `f32` array. Every [`Dataset`] owns its own mapping; any number of them may
//! map the same file at once. The mapping is released by [`Dataset::close`] or
//! when the dataset is dropped, whichever comes first. The file itself is
//! never removed.

use super::layout::{GridLayout, HOUR_SLAB_BYTES};
use super::scan::filename;
use crate::error::{DatasetError, Result};
use chrono::{DateTime, Utc};
use memmap2::{Mmap, MmapMut};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default location of wind data
pub const DEFAULT_DIRECTORY: &str = "/srv/wind-datasets";

#[derive(Debug)]
enum Backing {
    ReadOnly(Mmap),
    Writable(MmapMut),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::ReadOnly(map) => &map[..],
            Backing::Writable(map) => &map[..],
        }
    }
}

/// How to open a dataset file
///
/// ```rust,ignore
/// let ds = OpenOptions::new()
///     .derive_horizon(false)
///     .layout(GridLayout::new(72)?)
///     .open(&forecast_time, Path::new("/srv/wind-datasets"))?;
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    create: bool,
    derive_horizon: bool,
    layout: GridLayout,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenOptions {
    /// Open an existing file, deriving the horizon from its size
    pub fn new() -> Self {
        Self {
            create: false,
            derive_horizon: true,
            layout: GridLayout::default(),
        }
    }

    /// Create (or truncate) the file instead of opening an existing one
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Re-derive the hour axis from the file size before validating it.
    /// Ignored in create mode.
    pub fn derive_horizon(mut self, derive: bool) -> Self {
        self.derive_horizon = derive;
        self
    }

    /// Layout to create with, or to validate against when the horizon is
    /// not derived
    pub fn layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Open the dataset for `forecast_time` in `directory`
    ///
    /// # Errors
    /// - [`DatasetError::Io`] if the file cannot be opened, sized or mapped
    /// - [`DatasetError::SizeMismatch`] if an existing file's length does not
    ///   match the (possibly derived) layout
    pub fn open(&self, forecast_time: &DateTime<Utc>, directory: &Path) -> Result<Dataset> {
        let path = filename(forecast_time, directory, "");
        let mode = if self.create {
            "truncate and write"
        } else {
            "read"
        };
        info!("Opening dataset {} {} ({})", forecast_time, path.display(), mode);

        let (layout, backing) = if self.create {
            self.create_mapping(&path)?
        } else {
            self.read_mapping(&path)?
        };

        Ok(Dataset {
            forecast_time: *forecast_time,
            directory: directory.to_path_buf(),
            path,
            layout,
            backing: Some(backing),
        })
    }

    fn create_mapping(&self, path: &Path) -> Result<(GridLayout, Backing)> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| DatasetError::io(path, e))?;

        // Extend to full size before anything can map it
        file.set_len(self.layout.total_bytes())
            .map_err(|e| DatasetError::io(path, e))?;

        // SAFETY: the file was just truncated and sized by us; concurrent
        // external modification of a dataset file is outside the contract.
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(|e| DatasetError::io(path, e))?;
        Ok((self.layout.clone(), Backing::Writable(map)))
    }

    fn read_mapping(&self, path: &Path) -> Result<(GridLayout, Backing)> {
        let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
        let actual = file
            .metadata()
            .map_err(|e| DatasetError::io(path, e))?
            .len();

        let layout = if self.derive_horizon {
            GridLayout::from_hour_steps((actual / HOUR_SLAB_BYTES) as usize)
        } else {
            self.layout.clone()
        };

        let expected = layout.total_bytes();
        if actual != expected {
            return Err(DatasetError::SizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }

        // SAFETY: mapped read-only and shared; writers of dataset files
        // replace them wholesale rather than editing in place.
        let map = unsafe { Mmap::map(&file) }.map_err(|e| DatasetError::io(path, e))?;
        Ok((layout, Backing::ReadOnly(map)))
    }
}

/// A wind dataset for one forecast time
#[derive(Debug)]
pub struct Dataset {
    forecast_time: DateTime<Utc>,
    directory: PathBuf,
    path: PathBuf,
    layout: GridLayout,
    backing: Option<Backing>,
}

impl Dataset {
    /// Open an existing dataset read-only, deriving its horizon from the file
    /// size
    ///
    /// # Errors
    /// See [`OpenOptions::open`].
    pub fn open(forecast_time: &DateTime<Utc>, directory: &Path) -> Result<Self> {
        OpenOptions::new().open(forecast_time, directory)
    }

    /// Create a blank writable dataset, overwriting any existing file
    ///
    /// # Errors
    /// See [`OpenOptions::open`].
    pub fn create(
        forecast_time: &DateTime<Utc>,
        directory: &Path,
        layout: GridLayout,
    ) -> Result<Self> {
        OpenOptions::new()
            .create(true)
            .layout(layout)
            .open(forecast_time, directory)
    }

    pub fn forecast_time(&self) -> DateTime<Utc> {
        self.forecast_time
    }

    /// Forecast time as UNIX seconds
    pub fn epoch(&self) -> f64 {
        self.forecast_time.timestamp() as f64
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Hours of forecast available after the forecast time
    pub fn forecast_hours(&self) -> u32 {
        self.layout.forecast_hours()
    }

    pub fn is_open(&self) -> bool {
        self.backing.is_some()
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.backing, Some(Backing::Writable(_)))
    }

    fn backing(&self) -> Result<&Backing> {
        self.backing
            .as_ref()
            .ok_or_else(|| DatasetError::Closed(self.path.clone()))
    }

    /// Raw mapped bytes
    ///
    /// # Errors
    /// Returns [`DatasetError::Closed`] after [`Dataset::close`].
    pub fn as_bytes(&self) -> Result<&[u8]> {
        Ok(self.backing()?.bytes())
    }

    /// The whole grid as a flat row-major slice
    ///
    /// # Errors
    /// Returns [`DatasetError::Closed`] after [`Dataset::close`].
    pub fn values(&self) -> Result<&[f32]> {
        // Mappings are page aligned and sized to a whole number of elements
        Ok(bytemuck::cast_slice(self.as_bytes()?))
    }

    /// Read the element at (hour, pressure, variable, latitude, longitude)
    /// indices
    ///
    /// # Errors
    /// - [`DatasetError::OutOfBounds`] if any index exceeds its axis
    /// - [`DatasetError::Closed`] after [`Dataset::close`]
    pub fn get(&self, index: [usize; 5]) -> Result<f32> {
        let offset = self.checked_offset(index)?;
        Ok(self.values()?[offset])
    }

    /// Write one element of a dataset opened in create mode
    ///
    /// # Errors
    /// - [`DatasetError::OutOfBounds`] if any index exceeds its axis
    /// - [`DatasetError::ReadOnly`] for datasets opened for reading
    /// - [`DatasetError::Closed`] after [`Dataset::close`]
    pub fn set(&mut self, index: [usize; 5], value: f32) -> Result<()> {
        let offset = self.checked_offset(index)?;
        match self.backing.as_mut() {
            Some(Backing::Writable(map)) => {
                let values: &mut [f32] = bytemuck::cast_slice_mut(&mut map[..]);
                values[offset] = value;
                Ok(())
            }
            Some(Backing::ReadOnly(_)) => Err(DatasetError::ReadOnly(self.path.clone())),
            None => Err(DatasetError::Closed(self.path.clone())),
        }
    }

    /// Flush outstanding writes of a writable dataset to disk. A no-op for
    /// read-only datasets.
    ///
    /// # Errors
    /// - [`DatasetError::Io`] if the flush fails
    /// - [`DatasetError::Closed`] after [`Dataset::close`]
    pub fn flush(&self) -> Result<()> {
        match self.backing()? {
            Backing::Writable(map) => map.flush().map_err(|e| DatasetError::io(&self.path, e)),
            Backing::ReadOnly(_) => Ok(()),
        }
    }

    fn checked_offset(&self, index: [usize; 5]) -> Result<usize> {
        self.layout
            .offset(index)
            .ok_or(DatasetError::OutOfBounds {
                index,
                shape: self.layout.shape(),
            })
    }

    /// Release this instance's mapping
    ///
    /// Other datasets mapping the same file are unaffected. Calling this
    /// again is a no-op.
    pub fn close(&mut self) {
        if let Some(backing) = self.backing.take() {
            info!(
                "Closing dataset {} {}",
                self.forecast_time,
                self.path.display()
            );
            drop(backing);
        }
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        self.close();
    }
}
