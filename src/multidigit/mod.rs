//! Multiply-digitized inference from neighboring segment geometry.
//!
//! A segment is one carriageway of a divided road when another segment
//! runs alongside it: nearly parallel, close by, and either overlapping it
//! or sharing a nearby centroid.

mod index;
mod inference;

pub use index::SegmentIndex;
pub use inference::{
    overlap_length, Correction, InferenceReport, MultiDigitInferencer, NeighborScore,
    SegmentAssessment,
};

use serde::Deserialize;

/// Which rule turns a segment flag into a per-POI delete verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictPolicy {
    /// Stored YES is a delete unless the segment is a legitimate exception
    #[default]
    ExceptionAware,
    /// Stored YES on a long segment is a delete
    LongSegment,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MultiDigitConfig {
    /// Segments shorter than this are not assessed
    pub min_length: f64,
    /// Radius of the neighbor search buffer
    pub buffer_radius: f64,
    /// Max undirected angle between parallel carriageways, degrees
    pub max_angle_diff: f64,
    pub min_overlap_ratio: f64,
    pub max_centroid_distance: f64,
    /// A stored YES needs a segment longer than this to be legitimate
    pub exception_min_length: f64,
    pub verdict_policy: VerdictPolicy,
    /// Minimum segment length for [`VerdictPolicy::LongSegment`]
    pub long_segment_length: f64,
}

impl Default for MultiDigitConfig {
    fn default() -> Self {
        Self {
            min_length: 5.0,
            buffer_radius: 25.0,
            max_angle_diff: 20.0,
            min_overlap_ratio: 0.05,
            max_centroid_distance: 25.0,
            exception_min_length: 10.0,
            verdict_policy: VerdictPolicy::ExceptionAware,
            long_segment_length: 50.0,
        }
    }
}
