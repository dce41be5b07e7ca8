//! Flight profiles
//!
//! A flight is a chain of stages. Each [`FlightStage`] pairs a motion model
//! with the predicate that ends it; the integrator runs the first stage
//! from the launch point until its terminator fires, then hands the final
//! state to the next stage.
//!
//! The builders here assemble the usual profiles:
//! - [`standard_profile`]: ascent to burst, then parachute descent to the ground
//! - [`float_profile`]: ascent to float altitude, then drift until a stop time
//! - [`up_down_profile`]: day/night altitude control until a stop time
//!
//! Models may carry per-trajectory state, so build a fresh profile for every
//! trajectory.

use crate::models::{
    ConstantAscent, DragDescent, Model, SumModel, SunRelativeUpDown, UpDownSchedule, WindVelocity,
};
use crate::termination::{Burst, ElevationLookup, GroundElevation, Terminator, TimeBound};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One leg of a flight
pub struct FlightStage {
    pub model: Box<dyn Model>,
    pub terminator: Box<dyn Terminator>,
}

impl FlightStage {
    pub fn new(model: Box<dyn Model>, terminator: Box<dyn Terminator>) -> Self {
        Self { model, terminator }
    }
}

impl fmt::Debug for FlightStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlightStage").finish_non_exhaustive()
    }
}

/// Ordered stages of a flight
#[derive(Debug, Default)]
pub struct FlightProfile {
    stages: Vec<FlightStage>,
}

impl FlightProfile {
    pub fn new(stages: Vec<FlightStage>) -> Self {
        Self { stages }
    }

    /// Append a stage after the current last one
    pub fn push(&mut self, stage: FlightStage) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[FlightStage] {
        &self.stages
    }

    /// Stages for evaluation; models need `&mut` to update their state
    pub fn stages_mut(&mut self) -> &mut [FlightStage] {
        &mut self.stages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlightStage> {
        self.stages.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FlightStage> {
        self.stages.iter_mut()
    }
}

impl IntoIterator for FlightProfile {
    type Item = FlightStage;
    type IntoIter = std::vec::IntoIter<FlightStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}

impl<'a> IntoIterator for &'a mut FlightProfile {
    type Item = &'a mut FlightStage;
    type IntoIter = std::slice::IterMut<'a, FlightStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter_mut()
    }
}

impl<'a> IntoIterator for &'a FlightProfile {
    type Item = &'a FlightStage;
    type IntoIter = std::slice::Iter<'a, FlightStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

/// Ascent, burst, descent under parachute to the ground
///
/// # Arguments
///
/// * `ascent_rate` - Balloon ascent rate (m/s)
/// * `burst_altitude` - Altitude at which the balloon bursts (m)
/// * `descent_rate` - Parachute descent rate at sea level (m/s)
/// * `wind` - Horizontal drift, shared by both stages
/// * `elevation` - Terrain height lookup ending the descent
pub fn standard_profile(
    ascent_rate: f64,
    burst_altitude: f64,
    descent_rate: f64,
    wind: &WindVelocity,
    elevation: Arc<dyn ElevationLookup>,
) -> FlightProfile {
    let ascent = SumModel::new(vec![
        Box::new(ConstantAscent::new(ascent_rate)),
        Box::new(wind.clone()),
    ]);
    let descent = SumModel::new(vec![
        Box::new(DragDescent::new(descent_rate)),
        Box::new(wind.clone()),
    ]);

    FlightProfile::new(vec![
        FlightStage::new(Box::new(ascent), Box::new(Burst::new(burst_altitude))),
        FlightStage::new(Box::new(descent), Box::new(GroundElevation::new(elevation))),
    ])
}

/// Ascent to a float altitude, then drift with the wind until `stop_time`
pub fn float_profile(
    ascent_rate: f64,
    float_altitude: f64,
    stop_time: f64,
    wind: &WindVelocity,
) -> FlightProfile {
    let ascent = SumModel::new(vec![
        Box::new(ConstantAscent::new(ascent_rate)),
        Box::new(wind.clone()),
    ]);

    FlightProfile::new(vec![
        FlightStage::new(Box::new(ascent), Box::new(Burst::new(float_altitude))),
        FlightStage::new(Box::new(wind.clone()), Box::new(TimeBound::new(stop_time))),
    ])
}

/// Day/night altitude control with wind drift until `stop_time`
///
/// Each call builds a new scheduler, so descent tracking never leaks from
/// one trajectory into another.
pub fn up_down_profile(
    schedule: UpDownSchedule,
    stop_time: f64,
    wind: &WindVelocity,
) -> FlightProfile {
    let model = SumModel::new(vec![
        Box::new(SunRelativeUpDown::new(schedule)),
        Box::new(wind.clone()),
    ]);

    FlightProfile::new(vec![FlightStage::new(
        Box::new(model),
        Box::new(TimeBound::new(stop_time)),
    )])
}

/// A point on a predicted trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// UNIX seconds
    pub time: f64,
    /// Degrees
    pub lat: f64,
    /// Degrees east
    pub lng: f64,
    /// Metres above sea level
    pub alt: f64,
}

impl TrajectorySample {
    pub fn new(time: f64, lat: f64, lng: f64, alt: f64) -> Self {
        Self {
            time,
            lat,
            lng,
            alt,
        }
    }
}

/// Numerical integrator driving a [`FlightProfile`]
///
/// Implementations step each stage's model from the end of the previous
/// stage until the stage's terminator fires.
pub trait Integrator {
    /// Integrate `profile` from `launch`
    ///
    /// # Arguments
    ///
    /// * `launch` - Launch time and position
    /// * `profile` - Stages to run, in order
    /// * `resolution` - Time step in seconds
    ///
    /// # Returns
    ///
    /// One list of samples per stage that was run
    fn integrate(
        &mut self,
        launch: TrajectorySample,
        profile: &mut FlightProfile,
        resolution: f64,
    ) -> Vec<Vec<TrajectorySample>>;
}
