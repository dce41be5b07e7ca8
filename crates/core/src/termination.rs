//! Stage termination predicates
//!
//! A [`Terminator`] decides when the integrator should leave the current
//! flight stage. Predicates are pure and total; they never fail.

use std::fmt;
use std::sync::Arc;

/// End-of-stage predicate over the state `(t, lat, lng, alt)`
pub trait Terminator: Send {
    fn terminated(&self, t: f64, lat: f64, lng: f64, alt: f64) -> bool;
}

impl<F> Terminator for F
where
    F: Fn(f64, f64, f64, f64) -> bool + Send,
{
    fn terminated(&self, t: f64, lat: f64, lng: f64, alt: f64) -> bool {
        self(t, lat, lng, alt)
    }
}

/// Terrain height (metres above sea level) at a point
pub trait ElevationLookup: Send + Sync {
    fn lookup(&self, lat: f64, lng: f64) -> f64;
}

impl<F> ElevationLookup for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn lookup(&self, lat: f64, lng: f64) -> f64 {
        self(lat, lng)
    }
}

/// Balloon burst (or float start) at a fixed altitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    altitude: f64,
}

impl Burst {
    pub fn new(altitude: f64) -> Self {
        Self { altitude }
    }
}

impl Terminator for Burst {
    fn terminated(&self, _t: f64, _lat: f64, _lng: f64, alt: f64) -> bool {
        alt >= self.altitude
    }
}

/// Landing at sea level
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeaLevel;

impl Terminator for SeaLevel {
    fn terminated(&self, _t: f64, _lat: f64, _lng: f64, alt: f64) -> bool {
        alt <= 0.0
    }
}

/// Landing on the ground, wherever the terrain is
#[derive(Clone)]
pub struct GroundElevation {
    elevation: Arc<dyn ElevationLookup>,
}

impl GroundElevation {
    pub fn new(elevation: Arc<dyn ElevationLookup>) -> Self {
        Self { elevation }
    }
}

impl Terminator for GroundElevation {
    fn terminated(&self, _t: f64, lat: f64, lng: f64, alt: f64) -> bool {
        self.elevation.lookup(lat, lng) > alt
    }
}

impl fmt::Debug for GroundElevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroundElevation").finish_non_exhaustive()
    }
}

/// Stop once `t` passes a fixed time (UNIX seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBound {
    max_time: f64,
}

impl TimeBound {
    pub fn new(max_time: f64) -> Self {
        Self { max_time }
    }
}

impl Terminator for TimeBound {
    fn terminated(&self, t: f64, _lat: f64, _lng: f64, _alt: f64) -> bool {
        t > self.max_time
    }
}

/// True when any member is; an empty set never terminates
pub struct AnyOf {
    terminators: Vec<Box<dyn Terminator>>,
}

impl AnyOf {
    pub fn new(terminators: Vec<Box<dyn Terminator>>) -> Self {
        Self { terminators }
    }

    pub fn len(&self) -> usize {
        self.terminators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminators.is_empty()
    }
}

impl Terminator for AnyOf {
    fn terminated(&self, t: f64, lat: f64, lng: f64, alt: f64) -> bool {
        self.terminators
            .iter()
            .any(|terminator| terminator.terminated(t, lat, lng, alt))
    }
}

impl fmt::Debug for AnyOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyOf")
            .field("terminators", &self.terminators.len())
            .finish()
    }
}
