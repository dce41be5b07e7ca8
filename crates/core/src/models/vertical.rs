//! Vertical motion: constant-rate ascent and parachute descent
//!
//! # Scientific References
//!
//! - NASA Glenn Research Center, "Earth Atmosphere Model" (metric units),
//!   <https://www.grc.nasa.gov/WWW/K-12/airplane/atmosmet.html>

use super::{Derivative, Model};

/// Empirical factor turning a sea-level descent rate into a drag coefficient
pub const DRAG_SCALE: f64 = 1.1045;

/// Ascent at a fixed rate, regardless of position or time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantAscent {
    rate: f64,
}

impl ConstantAscent {
    /// `rate` in metres per second
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl Model for ConstantAscent {
    fn derivative(&mut self, _t: f64, _lat: f64, _lng: f64, _alt: f64) -> Derivative {
        Derivative::vertical(self.rate)
    }
}

/// Air density (kg/m³) at `alt` metres from the NASA standard atmosphere
///
/// Three regimes:
/// - above 25 km: upper stratosphere, temperature rising with altitude
/// - 11–25 km: lower stratosphere, isothermal at −56.46 °C
/// - below 11 km: troposphere, linear lapse rate
pub fn air_density(alt: f64) -> f64 {
    let (temperature, pressure) = if alt > 25000.0 {
        let t = -131.21 + 0.00299 * alt;
        (t, 2.488 * ((t + 273.1) / 216.6).powf(-11.388))
    } else if alt > 11000.0 {
        (-56.46, 22.65 * (1.73 - 0.000157 * alt).exp())
    } else {
        let t = 15.04 - 0.00649 * alt;
        (t, 101.29 * ((t + 273.1) / 288.08).powf(5.256))
    };
    pressure / (0.2869 * (temperature + 273.1))
}

/// Descent under parachute at terminal velocity
///
/// The drag coefficient is estimated from the descent rate expected at sea
/// level; descent is faster where the air is thinner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragDescent {
    drag_coefficient: f64,
}

impl DragDescent {
    /// `sea_level_rate` in metres per second, positive
    pub fn new(sea_level_rate: f64) -> Self {
        Self {
            drag_coefficient: sea_level_rate * DRAG_SCALE,
        }
    }

    /// Descent speed (positive, m/s) at `alt`
    pub fn descent_speed(&self, alt: f64) -> f64 {
        self.drag_coefficient / air_density(alt).sqrt()
    }
}

impl Model for DragDescent {
    fn derivative(&mut self, _t: f64, _lat: f64, _lng: f64, alt: f64) -> Derivative {
        Derivative::vertical(-self.descent_speed(alt))
    }
}
