//! Shared planar geometry helpers.
//!
//! All math in here assumes a planar frame. Geographic input goes through
//! [`projection`] first.

pub mod projection;
pub mod tiles;
mod vector;

pub use projection::{to_geographic, to_web_mercator, WebMercator};
pub use vector::{angle_difference, cross, line_angle, side_of_line};
