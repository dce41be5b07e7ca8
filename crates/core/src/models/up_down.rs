//! Day/night altitude scheduling for long-duration floats
//!
//! The balloon rises to its float altitude during the day and descends from
//! a configurable lead time before sunset until the following sunrise. The
//! moment the current descent began is carried as state of the model
//! instance, so every trajectory needs its own [`SunRelativeUpDown`].

use super::sun::{sunrise, sunset};
use super::{Derivative, Model};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Parameters of the day/night schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpDownSchedule {
    /// Ascent rate (m/s) while below float altitude in daylight
    pub ascent_rate: f64,
    /// Altitude (m) at which ascent stops
    pub float_altitude: f64,
    /// Descent rate (m/s, positive) inside the descent window
    pub descent_rate: f64,
    /// Seconds before sunset at which the descent window opens
    pub pre_sunset_lead: f64,
    /// Seconds of descent before holding altitude; negative for no limit
    pub descent_duration: f64,
}

/// Ascend by day, descend by night
#[derive(Debug, Clone)]
pub struct SunRelativeUpDown {
    schedule: UpDownSchedule,
    /// Time (UNIX seconds) the current descent window was entered
    descent_started: Option<f64>,
}

impl SunRelativeUpDown {
    pub fn new(schedule: UpDownSchedule) -> Self {
        Self {
            schedule,
            descent_started: None,
        }
    }

    pub fn schedule(&self) -> &UpDownSchedule {
        &self.schedule
    }

    /// When the descent in progress began, if descending
    pub fn descent_started(&self) -> Option<f64> {
        self.descent_started
    }

    fn in_descent_window(t: f64, descent_trigger: Option<f64>, sunrise_t: f64) -> bool {
        let Some(trigger) = descent_trigger.filter(|&trigger| trigger > 0.0) else {
            return false;
        };
        if trigger < sunrise_t {
            trigger < t && t < sunrise_t
        } else {
            t > trigger || t < sunrise_t
        }
    }
}

impl Model for SunRelativeUpDown {
    fn derivative(&mut self, t: f64, lat: f64, lng: f64, alt: f64) -> Derivative {
        let Some(now) = DateTime::from_timestamp(t.floor() as i64, 0) else {
            return Derivative::ZERO;
        };
        let date = now.date_naive();

        // Sun never crosses the horizon today (polar night or midnight
        // sun): stay put
        let Some(rise) = sunrise(date, lat, lng) else {
            return Derivative::ZERO;
        };
        let sunrise_t = rise.timestamp() as f64;

        // Without a sunset the descent window never opens
        let lead = self.schedule.pre_sunset_lead;
        let descent_trigger = sunset(date, lat, lng).map(|set| set.timestamp() as f64 - lead);

        if Self::in_descent_window(t, descent_trigger, sunrise_t) {
            let started = *self.descent_started.get_or_insert(t);
            let duration = self.schedule.descent_duration;
            if duration >= 0.0 && t > started + duration {
                return Derivative::ZERO;
            }
            return Derivative::vertical(-self.schedule.descent_rate);
        }

        self.descent_started = None;
        if alt < self.schedule.float_altitude {
            Derivative::vertical(self.schedule.ascent_rate)
        } else {
            Derivative::ZERO
        }
    }
}
