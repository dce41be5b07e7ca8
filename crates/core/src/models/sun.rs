//! Sunrise and sunset times
//!
//! Implements the sunrise/sunset algorithm from the *Almanac for Computers*
//! (Nautical Almanac Office, 1990), accurate to about a minute between the
//! polar circles. Times are UTC on the requested calendar date.
//!
//! Near the poles the sun may not cross the horizon at all on a given date;
//! both events are then reported as absent.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// Official zenith for sunrise/sunset, including refraction and the solar
/// disc radius (degrees)
pub const ZENITH: f64 = 90.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Rise,
    Set,
}

/// Sunrise at `lat`, `lng` (degrees, east positive, any range) on `date`
///
/// `None` when the sun never rises or never sets there on that date.
pub fn sunrise(date: NaiveDate, lat: f64, lng: f64) -> Option<DateTime<Utc>> {
    sun_time(date, lat, lng, Event::Rise)
}

/// Sunset at `lat`, `lng` on `date`; `None` as for [`sunrise`]
pub fn sunset(date: NaiveDate, lat: f64, lng: f64) -> Option<DateTime<Utc>> {
    sun_time(date, lat, lng, Event::Set)
}

fn force_range(value: f64, max: f64) -> f64 {
    value.rem_euclid(max)
}

fn sun_time(date: NaiveDate, lat: f64, lng: f64, event: Event) -> Option<DateTime<Utc>> {
    let day_of_year = f64::from(date.ordinal());

    // Approximate time, from longitude hour
    let lng_hour = lng / 15.0;
    let t = match event {
        Event::Rise => day_of_year + (6.0 - lng_hour) / 24.0,
        Event::Set => day_of_year + (18.0 - lng_hour) / 24.0,
    };

    // Mean anomaly and true longitude
    let m = 0.9856 * t - 3.289;
    let l = force_range(
        m + 1.916 * m.to_radians().sin() + 0.020 * (2.0 * m).to_radians().sin() + 282.634,
        360.0,
    );

    // Right ascension, in the same quadrant as L, in hours
    let mut ra = force_range((0.91764 * l.to_radians().tan()).atan().to_degrees(), 360.0);
    ra += (l / 90.0).floor() * 90.0 - (ra / 90.0).floor() * 90.0;
    ra /= 15.0;

    // Declination
    let sin_dec = 0.39782 * l.to_radians().sin();
    let cos_dec = sin_dec.asin().cos();

    // Local hour angle
    let cos_h = (ZENITH.to_radians().cos() - sin_dec * lat.to_radians().sin())
        / (cos_dec * lat.to_radians().cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        // > 1: never rises; < -1: never sets
        return None;
    }
    let h = match event {
        Event::Rise => 360.0 - cos_h.acos().to_degrees(),
        Event::Set => cos_h.acos().to_degrees(),
    } / 15.0;

    // Local mean time, then back to UTC
    let local = h + ra - 0.06571 * t - 6.622;
    let utc_hours = force_range(local - lng_hour, 24.0);

    let seconds = (utc_hours * 3600.0).round() as u32;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(midnight + chrono::Duration::seconds(i64::from(seconds.min(86399))))
}
