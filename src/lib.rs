//! Curbside - consistency checks for POI sides and divided-road flags
//!
//! This library provides the classification and inference core shared by
//! the validate and inspect binaries.

pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod imagery;
pub mod models;
pub mod multidigit;
pub mod pipeline;
pub mod review;
pub mod side;

pub use config::{Config, Profile};
pub use error::{Error, Result};
pub use models::{Poi, PoiResult, Segment};
pub use pipeline::{ValidationOutcome, Validator};
