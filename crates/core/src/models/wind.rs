//! Horizontal drift with the wind

use super::{Derivative, Model};
use crate::dataset::Dataset;
use std::fmt;
use std::sync::Arc;

/// Mean earth radius (m)
pub const EARTH_RADIUS: f64 = 6371009.0;

/// Interpolated wind at an arbitrary point
///
/// Implemented by the grid interpolation routine, which samples the `u` and
/// `v` components of a [`Dataset`] between grid points.
pub trait WindSampler: Send + Sync {
    /// Eastward and northward wind (m/s) at `hours` after the dataset's
    /// forecast time, `lat`/`lng` in degrees and `alt` metres above sea level
    fn sample(&self, hours: f64, lat: f64, lng: f64, alt: f64) -> (f64, f64);
}

impl<F> WindSampler for F
where
    F: Fn(f64, f64, f64, f64) -> (f64, f64) + Send + Sync,
{
    fn sample(&self, hours: f64, lat: f64, lng: f64, alt: f64) -> (f64, f64) {
        self(hours, lat, lng, alt)
    }
}

/// Lateral movement at the wind velocity
///
/// Grounded payloads (altitude at or below zero) do not drift. Cloning is
/// cheap; clones share the sampler.
#[derive(Clone)]
pub struct WindVelocity {
    sampler: Arc<dyn WindSampler>,
    epoch: f64,
}

impl WindVelocity {
    /// `epoch` is the forecast time of the sampled dataset, UNIX seconds
    pub fn new(sampler: Arc<dyn WindSampler>, epoch: f64) -> Self {
        Self { sampler, epoch }
    }

    /// Wind from `sampler`, with times measured from `dataset`'s forecast time
    pub fn for_dataset(sampler: Arc<dyn WindSampler>, dataset: &Dataset) -> Self {
        Self::new(sampler, dataset.epoch())
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }
}

impl Model for WindVelocity {
    fn derivative(&mut self, t: f64, lat: f64, lng: f64, alt: f64) -> Derivative {
        if alt <= 0.0 {
            return Derivative::ZERO;
        }

        let hours = (t - self.epoch) / 3600.0;
        let (u, v) = self.sampler.sample(hours, lat, lng, alt);

        let r = EARTH_RADIUS + alt;
        let d_lat = v.to_degrees() / r;
        let d_lng = u.to_degrees() / (r * lat.to_radians().cos());
        Derivative::new(d_lat, d_lng, 0.0)
    }
}

impl fmt::Debug for WindVelocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindVelocity")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}
