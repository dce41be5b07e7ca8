//! Balloon Flight Prediction Core Library
//!
//! Storage and flight dynamics for a high-altitude balloon trajectory
//! predictor driven by global wind forecasts.
//!
//! ## Wind datasets
//!
//! Forecasts are kept as headerless `f32` grids over
//! (hour, pressure level, variable, latitude, longitude), one file per
//! forecast run, named after the run's `YYYYMMDDHH`. [`dataset`] maps them
//! into memory, scans directories for them, and keeps the newest one open
//! in a short-lived cache.
//!
//! ## Flight dynamics
//!
//! [`models`] provides the motion models (ascent, parachute descent, wind
//! drift, day/night altitude control), [`termination`] the predicates that
//! end a flight stage, and [`profile`] chains them into the stages an
//! external integrator runs.

pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod profile;
pub mod termination;

// Re-export the types most callers need
pub use config::PredictorConfig;
pub use dataset::{latest, Dataset, DatasetEntry, GridLayout, LatestCache, OpenOptions};
pub use error::{DatasetError, Result};
pub use models::{Derivative, Model, SumModel, UpDownSchedule, WindSampler, WindVelocity};
pub use profile::{
    float_profile, standard_profile, up_down_profile, FlightProfile, FlightStage, Integrator,
    TrajectorySample,
};
pub use termination::{AnyOf, ElevationLookup, Terminator};
