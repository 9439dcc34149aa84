//! Core data models for the validation pass.

pub mod poi;
pub mod segment;
pub mod verdict;

pub use poi::{Poi, PoiResult};
pub use segment::{Segment, TravelDirection};
pub use verdict::{MultiDigit, MultiDigitVerdict, Side, SideVerdict};
