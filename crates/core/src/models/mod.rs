//! Balloon motion models
//!
//! A model maps the current state `(t, lat, lng, alt)` to the rate of change
//! of each coordinate: degrees per second for latitude and longitude, metres
//! per second for altitude. Models say nothing about how the integrator steps
//! through time; they are sampled wherever the integrator asks.
//!
//! Vertical models ([`ConstantAscent`], [`DragDescent`],
//! [`SunRelativeUpDown`]) and the horizontal [`WindVelocity`] model are
//! combined with [`SumModel`].

pub mod sun;
pub mod up_down;
pub mod vertical;
pub mod wind;

use std::iter::Sum;
use std::ops::{Add, AddAssign};

pub use up_down::{SunRelativeUpDown, UpDownSchedule};
pub use vertical::{air_density, ConstantAscent, DragDescent, DRAG_SCALE};
pub use wind::{WindSampler, WindVelocity, EARTH_RADIUS};

/// Rate of change of (latitude, longitude, altitude)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Derivative {
    /// Degrees per second
    pub d_lat: f64,
    /// Degrees per second
    pub d_lng: f64,
    /// Metres per second
    pub d_alt: f64,
}

impl Derivative {
    pub const ZERO: Derivative = Derivative::new(0.0, 0.0, 0.0);

    pub const fn new(d_lat: f64, d_lng: f64, d_alt: f64) -> Self {
        Self { d_lat, d_lng, d_alt }
    }

    /// Purely vertical motion
    pub const fn vertical(d_alt: f64) -> Self {
        Self::new(0.0, 0.0, d_alt)
    }
}

impl Add for Derivative {
    type Output = Derivative;

    fn add(self, rhs: Derivative) -> Derivative {
        Derivative::new(
            self.d_lat + rhs.d_lat,
            self.d_lng + rhs.d_lng,
            self.d_alt + rhs.d_alt,
        )
    }
}

impl AddAssign for Derivative {
    fn add_assign(&mut self, rhs: Derivative) {
        *self = *self + rhs;
    }
}

impl Sum for Derivative {
    fn sum<I: Iterator<Item = Derivative>>(iter: I) -> Derivative {
        iter.fold(Derivative::ZERO, Add::add)
    }
}

/// A flight-dynamics model
///
/// `derivative` takes `&mut self` so that a model may carry evaluation state
/// private to the trajectory it was built for (see [`SunRelativeUpDown`]).
/// Build one model per trajectory; never share an instance between
/// trajectories.
pub trait Model: Send {
    /// State derivative at time `t` (UNIX seconds) and position `lat`, `lng`
    /// (degrees), `alt` (metres above sea level)
    fn derivative(&mut self, t: f64, lat: f64, lng: f64, alt: f64) -> Derivative;
}

impl<F> Model for F
where
    F: FnMut(f64, f64, f64, f64) -> Derivative + Send,
{
    fn derivative(&mut self, t: f64, lat: f64, lng: f64, alt: f64) -> Derivative {
        self(t, lat, lng, alt)
    }
}

/// Sum of several models, component by component
///
/// An empty sum is the zero derivative.
pub struct SumModel {
    models: Vec<Box<dyn Model>>,
}

impl SumModel {
    pub fn new(models: Vec<Box<dyn Model>>) -> Self {
        Self { models }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Model for SumModel {
    fn derivative(&mut self, t: f64, lat: f64, lng: f64, alt: f64) -> Derivative {
        self.models
            .iter_mut()
            .map(|model| model.derivative(t, lat, lng, alt))
            .sum()
    }
}

impl std::fmt::Debug for SumModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumModel")
            .field("models", &self.models.len())
            .finish()
    }
}
