//! Dimensional shape and axis coordinates of a wind dataset
//!
//! A dataset is a dense 5-D grid of `f32` values, row-major in the order
//! (hour, pressure, variable, latitude, longitude). Only the hour axis depends
//! on the forecast horizon; the other four are fixed by the upstream GFS
//! product the grids are assembled from.

use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};

/// Hours between consecutive forecast steps
pub const HOUR_STEP: u32 = 3;

/// Horizon of a full forecast run
pub const DEFAULT_FORECAST_HOURS: u32 = 192;

/// Size in bytes of one grid element (`f32`)
pub const ELEMENT_SIZE: usize = 4;

/// Pressure levels (mb) contained in a "pgrb2f" file
pub const PRESSURES_PGRB2F: [u32; 26] = [
    10, 20, 30, 50, 70, 100, 150, 200, 250, 300, 350, 400, 450, 500, 550, 600, 650, 700, 750, 800,
    850, 900, 925, 950, 975, 1000,
];

/// Pressure levels (mb) contained in a "pgrb2bf" file
pub const PRESSURES_PGRB2BF: [u32; 21] = [
    1, 2, 3, 5, 7, 125, 175, 225, 275, 325, 375, 425, 475, 525, 575, 625, 675, 725, 775, 825, 875,
];

pub const PRESSURE_LEVELS: usize = PRESSURES_PGRB2F.len() + PRESSURES_PGRB2BF.len();
pub const VARIABLES: usize = 3;
pub const LATITUDE_POINTS: usize = 361;
pub const LONGITUDE_POINTS: usize = 720;

/// Bytes occupied by a single forecast hour (all levels, variables, lat, lng)
pub const HOUR_SLAB_BYTES: u64 =
    (ELEMENT_SIZE * PRESSURE_LEVELS * VARIABLES * LATITUDE_POINTS * LONGITUDE_POINTS) as u64;

/// Quantity stored along the variable axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Geopotential height (m)
    Height,
    /// Eastward wind component (m/s)
    WindU,
    /// Northward wind component (m/s)
    WindV,
}

impl Variable {
    pub const ALL: [Variable; VARIABLES] = [Variable::Height, Variable::WindU, Variable::WindV];

    /// Position of this variable on the variable axis
    pub fn index(self) -> usize {
        match self {
            Variable::Height => 0,
            Variable::WindU => 1,
            Variable::WindV => 2,
        }
    }
}

/// Coordinate values along each of the five grid dimensions
///
/// `axes.pressure[4]` is `900`: cells `[_, 4, _, _, _]` hold data at 900 mb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    /// Forecast hours after the dataset's forecast time
    pub hour: Vec<u32>,
    /// Pressure levels in millibars, descending
    pub pressure: Vec<u32>,
    pub variable: Vec<Variable>,
    /// Degrees, -90.0 ..= 90.0
    pub latitude: Vec<f64>,
    /// Degrees, 0.0 .. 360.0
    pub longitude: Vec<f64>,
}

impl Axes {
    fn lengths(&self) -> [usize; 5] {
        [
            self.hour.len(),
            self.pressure.len(),
            self.variable.len(),
            self.latitude.len(),
            self.longitude.len(),
        ]
    }
}

/// Shape, axes and byte size of a dataset for one forecast horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    forecast_hours: u32,
    shape: [usize; 5],
    axes: Axes,
}

impl GridLayout {
    /// Derive the layout for `forecast_hours` of forecast
    ///
    /// # Errors
    /// Returns [`DatasetError::InvalidHorizon`] if the horizon is not a
    /// multiple of [`HOUR_STEP`].
    pub fn new(forecast_hours: u32) -> Result<Self> {
        if forecast_hours % HOUR_STEP != 0 {
            return Err(DatasetError::InvalidHorizon(forecast_hours));
        }

        let hour: Vec<u32> = (0..=forecast_hours).step_by(HOUR_STEP as usize).collect();

        let mut pressure: Vec<u32> = PRESSURES_PGRB2F
            .iter()
            .chain(PRESSURES_PGRB2BF.iter())
            .copied()
            .collect();
        pressure.sort_unstable_by(|a, b| b.cmp(a));

        let latitude = (-180..=180).map(|x| f64::from(x) / 2.0).collect();
        let longitude = (0..720).map(|x| f64::from(x) / 2.0).collect();

        let shape = [
            hour.len(),
            PRESSURE_LEVELS,
            VARIABLES,
            LATITUDE_POINTS,
            LONGITUDE_POINTS,
        ];
        let axes = Axes {
            hour,
            pressure,
            variable: Variable::ALL.to_vec(),
            latitude,
            longitude,
        };

        // Fixed construction rules; a mismatch here is a bug, not bad input
        assert_eq!(shape, axes.lengths(), "grid shape disagrees with its axes");

        Ok(Self {
            forecast_hours,
            shape,
            axes,
        })
    }

    /// Layout holding `hour_steps` forecast steps (at least one)
    pub fn from_hour_steps(hour_steps: usize) -> Self {
        let steps = hour_steps.max(1) as u32;
        match Self::new((steps - 1) * HOUR_STEP) {
            Ok(layout) => layout,
            Err(_) => unreachable!("horizon derived from step count is a multiple of the step"),
        }
    }

    pub fn forecast_hours(&self) -> u32 {
        self.forecast_hours
    }

    /// Extents of (hour, pressure, variable, latitude, longitude)
    pub fn shape(&self) -> [usize; 5] {
        self.shape
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Number of `f32` elements in the grid
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Exact on-disk size of a dataset with this layout
    pub fn total_bytes(&self) -> u64 {
        (self.element_count() * ELEMENT_SIZE) as u64
    }

    /// Flat row-major element offset of `index`, or `None` if any component
    /// is outside its axis
    pub fn offset(&self, index: [usize; 5]) -> Option<usize> {
        let mut offset = 0;
        for (i, extent) in index.iter().zip(self.shape) {
            if *i >= extent {
                return None;
            }
            offset = offset * extent + i;
        }
        Some(offset)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::from_hour_steps((DEFAULT_FORECAST_HOURS / HOUR_STEP + 1) as usize)
    }
}
