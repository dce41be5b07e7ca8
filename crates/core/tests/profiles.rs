use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use flight_predict_core::models::{ConstantAscent, DragDescent, SunRelativeUpDown, EARTH_RADIUS};
use flight_predict_core::termination::{Burst, SeaLevel, TimeBound};
use flight_predict_core::{
    float_profile, standard_profile, up_down_profile, AnyOf, Derivative, ElevationLookup,
    FlightProfile, Integrator, Model, SumModel, Terminator, TrajectorySample, UpDownSchedule,
    WindSampler, WindVelocity,
};
use std::sync::Arc;

/// Forward Euler, enough to drive the profiles in tests
struct Euler {
    max_steps: usize,
}

impl Integrator for Euler {
    fn integrate(
        &mut self,
        launch: TrajectorySample,
        profile: &mut FlightProfile,
        resolution: f64,
    ) -> Vec<Vec<TrajectorySample>> {
        let mut state = launch;
        let mut legs = Vec::new();

        for stage in profile.stages_mut() {
            let mut leg = vec![state];
            for _ in 0..self.max_steps {
                if stage
                    .terminator
                    .terminated(state.time, state.lat, state.lng, state.alt)
                {
                    break;
                }
                let d = stage
                    .model
                    .derivative(state.time, state.lat, state.lng, state.alt);
                state = TrajectorySample::new(
                    state.time + resolution,
                    state.lat + d.d_lat * resolution,
                    state.lng + d.d_lng * resolution,
                    state.alt + d.d_alt * resolution,
                );
                leg.push(state);
            }
            legs.push(leg);
        }
        legs
    }
}

fn launch_time() -> f64 {
    Utc.with_ymd_and_hms(2014, 3, 20, 12, 0, 0).unwrap().timestamp() as f64
}

fn steady_wind(u: f64, v: f64) -> WindVelocity {
    let sampler: Arc<dyn WindSampler> =
        Arc::new(move |_h: f64, _lat: f64, _lng: f64, _alt: f64| (u, v));
    WindVelocity::new(sampler, launch_time())
}

fn sea_level_terrain() -> Arc<dyn ElevationLookup> {
    Arc::new(|_lat: f64, _lng: f64| 0.0)
}

#[test]
fn test_standard_flight_rises_bursts_and_lands() {
    let wind = steady_wind(0.0, 0.0);
    let mut profile = standard_profile(5.0, 30000.0, 5.0, &wind, sea_level_terrain());
    let launch = TrajectorySample::new(launch_time(), 52.2, 0.1, 0.0);

    let legs = Euler { max_steps: 100_000 }.integrate(launch, &mut profile, 10.0);
    assert_eq!(legs.len(), 2);

    let burst = *legs[0].last().unwrap();
    assert!(burst.alt >= 30000.0);
    // 30 km at 5 m/s
    assert_relative_eq!(burst.time - launch.time, 6000.0, epsilon = 10.0);

    let landing = *legs[1].last().unwrap();
    assert!(landing.alt < 0.0);
    assert!(landing.time > burst.time);
    // Calm air: no drift
    assert_eq!((landing.lat, landing.lng), (launch.lat, launch.lng));
}

#[test]
fn test_wind_drift_during_ascent() {
    let mut profile = float_profile(5.0, 1000.0, launch_time() + 200.0, &steady_wind(10.0, 0.0));
    // Start aloft so the wind applies from the first step
    let launch = TrajectorySample::new(launch_time(), 0.0, 10.0, 1.0);

    let legs = Euler { max_steps: 1000 }.integrate(launch, &mut profile, 1.0);
    let top = *legs[0].last().unwrap();
    let elapsed = top.time - launch.time;
    assert_relative_eq!(elapsed, 200.0, epsilon = 1.0);

    // ~10 m/s east along the equator
    let metres_east = (top.lng - launch.lng).to_radians() * EARTH_RADIUS;
    assert_relative_eq!(metres_east, 10.0 * elapsed, max_relative = 1e-3);
    assert_eq!(top.lat, 0.0);
}

#[test]
fn test_sum_of_models_is_sum_of_derivatives() {
    let states = [
        (launch_time(), 0.0, 0.0, 100.0),
        (launch_time() + 3600.0, 45.0, 350.0, 12000.0),
        (launch_time() + 86400.0, -60.0, 180.0, 31000.0),
    ];

    for (t, lat, lng, alt) in states {
        let mut parts: Vec<Box<dyn Model>> = vec![
            Box::new(ConstantAscent::new(4.0)),
            Box::new(DragDescent::new(6.0)),
            Box::new(steady_wind(3.0, -7.0)),
        ];
        let expected: Derivative = parts
            .iter_mut()
            .map(|m| m.derivative(t, lat, lng, alt))
            .sum();

        let mut sum = SumModel::new(vec![
            Box::new(ConstantAscent::new(4.0)),
            Box::new(DragDescent::new(6.0)),
            Box::new(steady_wind(3.0, -7.0)),
        ]);
        assert_eq!(sum.derivative(t, lat, lng, alt), expected);
    }
}

#[test]
fn test_any_of_matches_disjunction() {
    let states = [
        (0.0, 0.0, 0.0, -1.0),
        (0.0, 0.0, 0.0, 500.0),
        (2000.0, 0.0, 0.0, 500.0),
        (0.0, 0.0, 0.0, 40000.0),
    ];
    let members = || -> Vec<Box<dyn Terminator>> {
        vec![
            Box::new(SeaLevel),
            Box::new(TimeBound::new(1000.0)),
            Box::new(Burst::new(35000.0)),
        ]
    };

    let any = AnyOf::new(members());
    for (t, lat, lng, alt) in states {
        let expected = members().iter().any(|m| m.terminated(t, lat, lng, alt));
        assert_eq!(any.terminated(t, lat, lng, alt), expected, "at t={t} alt={alt}");
    }
    assert!(!AnyOf::new(Vec::new()).terminated(1e12, 0.0, 0.0, -5.0));
}

fn schedule() -> UpDownSchedule {
    UpDownSchedule {
        ascent_rate: 2.0,
        float_altitude: 5000.0,
        descent_rate: 1.0,
        pre_sunset_lead: 0.0,
        descent_duration: 1800.0,
    }
}

#[test]
fn test_up_down_trajectories_are_isolated() {
    // Equator at the date line: descent window ~06:11..18:05 UTC
    let wind = steady_wind(0.0, 0.0);
    let stop = launch_time() + 3.0 * 3600.0;
    let launch = TrajectorySample::new(launch_time(), 0.0, 180.0, 5000.0);

    let mut first = up_down_profile(schedule(), stop, &wind);
    let mut second = up_down_profile(schedule(), stop, &wind);

    let a = Euler { max_steps: 100_000 }.integrate(launch, &mut first, 60.0);
    let b = Euler { max_steps: 100_000 }.integrate(launch, &mut second, 60.0);

    // Both descend for exactly their own half hour, then hold
    let final_a = *a[0].last().unwrap();
    let final_b = *b[0].last().unwrap();
    assert_relative_eq!(final_a.alt, 5000.0 - 1800.0, epsilon = 61.0);
    assert_eq!(final_a, final_b);
}

#[test]
fn test_scheduler_instances_share_no_state() {
    let t = launch_time();
    let mut early = SunRelativeUpDown::new(schedule());
    let mut late = SunRelativeUpDown::new(schedule());

    // Entered the window two hours ago; its descent is over
    early.derivative(t - 7200.0, 0.0, 180.0, 5000.0);
    assert_eq!(early.derivative(t, 0.0, 180.0, 3200.0), Derivative::ZERO);

    // A new trajectory starting now still gets its full descent
    assert_eq!(late.derivative(t, 0.0, 180.0, 5000.0).d_alt, -1.0);
}
