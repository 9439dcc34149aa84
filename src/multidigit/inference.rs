//! Neighbor scoring, inference and flag correction.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Centroid, Distance, Euclidean, LineString};
use tracing::{debug, info};

use super::{MultiDigitConfig, SegmentIndex};
use crate::geometry::{angle_difference, line_angle};
use crate::models::{MultiDigit, Segment};
use crate::review::{Decision, Reviewer};

/// Similarity between a segment and one nearby segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborScore {
    pub neighbor: usize,
    /// Undirected angle between the two chords, `[0, 90]` degrees
    pub angle_diff: f64,
    /// Share of the segment's length covered by the neighbor
    pub overlap_ratio: f64,
    pub centroid_distance: f64,
}

impl NeighborScore {
    pub fn is_valid(&self, config: &MultiDigitConfig) -> bool {
        self.angle_diff <= config.max_angle_diff
            && (self.overlap_ratio >= config.min_overlap_ratio
                || self.centroid_distance < config.max_centroid_distance)
    }
}

/// Result of assessing one segment against the frozen dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentAssessment {
    pub index: usize,
    pub length: f64,
    pub inferred: MultiDigit,
    /// Stored flag, normalized, as it was before any correction
    pub stored: MultiDigit,
    pub valid_neighbors: Vec<usize>,
    /// Stored YES backed by geometry
    pub legitimate_exception: bool,
}

impl SegmentAssessment {
    pub fn is_consistent(&self) -> bool {
        self.inferred == self.stored
    }
}

/// A proposed overwrite of a stored flag
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub index: usize,
    pub link_id: String,
    pub original: MultiDigit,
    pub inferred: MultiDigit,
}

/// Outcome of a full inference pass
#[derive(Debug, Clone, Default)]
pub struct InferenceReport {
    /// One entry per input segment; `None` for skipped segments
    pub assessments: Vec<Option<SegmentAssessment>>,
    /// Indices whose stored flag was overwritten
    pub updated_segments: Vec<usize>,
    /// Corrections a reviewer turned down
    pub rejected: Vec<Correction>,
}

impl InferenceReport {
    /// `EXCEPTION_LEGIT` per segment; skipped segments are NO
    pub fn exception_flags(&self) -> Vec<MultiDigit> {
        self.assessments
            .iter()
            .map(|a| {
                MultiDigit::from_bool(a.as_ref().is_some_and(|a| a.legitimate_exception))
            })
            .collect()
    }

    /// Segments with a stored YES that geometry does not back up
    pub fn demotion_candidates(&self) -> impl Iterator<Item = &SegmentAssessment> {
        self.assessments
            .iter()
            .flatten()
            .filter(|a| a.stored.is_yes() && !a.legitimate_exception)
    }

    pub fn has_changes(&self) -> bool {
        !self.updated_segments.is_empty()
    }
}

/// Total length of the collinear overlap between two polylines
pub fn overlap_length(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    let mut total = 0.0;
    for la in a.lines() {
        for lb in b.lines() {
            if let Some(LineIntersection::Collinear { intersection }) = line_intersection(la, lb) {
                let d = intersection.delta();
                total += d.x.hypot(d.y);
            }
        }
    }
    total
}

pub struct MultiDigitInferencer {
    config: MultiDigitConfig,
}

impl MultiDigitInferencer {
    pub fn new(config: MultiDigitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MultiDigitConfig {
        &self.config
    }

    /// Score `candidate` as a neighbor of `segment`.
    ///
    /// `None` when either side has no usable geometry or angle.
    pub fn score(&self, segment: &Segment, candidate: (usize, &Segment)) -> Option<NeighborScore> {
        let (neighbor, other) = candidate;
        let line = segment.line()?;
        let other_line = other.line()?;

        let angle_diff = angle_difference(line_angle(line)?, line_angle(other_line)?);

        let length = segment.length();
        let overlap_ratio = if length > 0.0 {
            overlap_length(line, other_line) / length
        } else {
            0.0
        };

        let centroid_distance = match (line.centroid(), other_line.centroid()) {
            (Some(a), Some(b)) => Euclidean.distance(&a, &b),
            _ => f64::INFINITY,
        };

        Some(NeighborScore {
            neighbor,
            angle_diff,
            overlap_ratio,
            centroid_distance,
        })
    }

    /// Assess the segment at `index`. Reads `segments` only.
    ///
    /// Short segments and segments without an angle are skipped.
    pub fn assess_one(
        &self,
        segments: &[Segment],
        spatial: &SegmentIndex,
        index: usize,
    ) -> Option<SegmentAssessment> {
        let segment = &segments[index];
        let length = segment.length();
        if length < self.config.min_length {
            return None;
        }
        let line = segment.line()?;
        line_angle(line)?;

        let mut valid_neighbors = Vec::new();
        for candidate in spatial.candidates(segment, self.config.buffer_radius) {
            let other = &segments[candidate];
            // Unset link ids never match each other
            let same_link = !segment.link_id.is_empty() && other.link_id == segment.link_id;
            if candidate == index || same_link {
                continue;
            }
            let Some(other_line) = other.geometry.as_ref() else {
                continue;
            };
            // Buffer intersection: within the radius of the segment
            if Euclidean.distance(line, other_line) > self.config.buffer_radius {
                continue;
            }
            let Some(score) = self.score(segment, (candidate, other)) else {
                continue;
            };

            debug!(
                "Segment {}: neighbor {} angle diff={:.1}, overlap={:.2}, dist={:.1}",
                index, candidate, score.angle_diff, score.overlap_ratio, score.centroid_distance
            );

            if score.is_valid(&self.config) {
                valid_neighbors.push(candidate);
            }
        }

        let stored = segment.multidigit();
        let inferred = MultiDigit::from_bool(!valid_neighbors.is_empty());
        let legitimate_exception = stored.is_yes()
            && !valid_neighbors.is_empty()
            && length > self.config.exception_min_length;

        Some(SegmentAssessment {
            index,
            length,
            inferred,
            stored,
            valid_neighbors,
            legitimate_exception,
        })
    }

    /// Assess every segment against the same frozen snapshot
    pub fn assess(&self, segments: &[Segment]) -> Vec<Option<SegmentAssessment>> {
        let spatial = SegmentIndex::build(segments);
        (0..segments.len())
            .map(|index| self.assess_one(segments, &spatial, index))
            .collect()
    }

    /// Assess, then write every inconsistent flag back in one batch
    pub fn run(&self, segments: &mut [Segment], reviewer: &mut dyn Reviewer) -> InferenceReport {
        let assessments = self.assess(segments);
        let report = apply_corrections(segments, assessments, reviewer);

        info!(
            "Multi-digit pass: {} segments, {} assessed, {} corrected, {} rejected",
            segments.len(),
            report.assessments.iter().flatten().count(),
            report.updated_segments.len(),
            report.rejected.len()
        );
        report
    }
}

/// Overwrite inconsistent stored flags with the inferred value.
///
/// Each proposal goes through `reviewer`; rejected ones keep the stored
/// value and are reported separately.
pub fn apply_corrections(
    segments: &mut [Segment],
    assessments: Vec<Option<SegmentAssessment>>,
    reviewer: &mut dyn Reviewer,
) -> InferenceReport {
    let mut updated_segments = Vec::new();
    let mut rejected = Vec::new();

    for assessment in assessments.iter().flatten() {
        if assessment.is_consistent() {
            continue;
        }
        let segment = &mut segments[assessment.index];
        let correction = Correction {
            index: assessment.index,
            link_id: segment.link_id.clone(),
            original: assessment.stored,
            inferred: assessment.inferred,
        };

        match reviewer.review(&correction) {
            Decision::Accept => {
                segment.multidigit_code = correction.inferred.as_str().to_string();
                updated_segments.push(correction.index);
            }
            Decision::Reject => rejected.push(correction),
        }
    }

    InferenceReport {
        assessments,
        updated_segments,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::AcceptAll;
    use geo::line_string;

    struct RejectAll;

    impl Reviewer for RejectAll {
        fn review(&mut self, _correction: &Correction) -> Decision {
            Decision::Reject
        }
    }

    fn inferencer() -> MultiDigitInferencer {
        MultiDigitInferencer::new(MultiDigitConfig::default())
    }

    fn parallel_pair(flag: &str) -> Vec<Segment> {
        vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 30.0, y: 0.0)]))
                .with_multidigit(flag),
            Segment::new("2", Some(line_string![(x: 0.0, y: 10.0), (x: 30.0, y: 10.0)]))
                .with_multidigit(flag),
        ]
    }

    #[test]
    fn test_parallel_pair_corrected() {
        let mut segments = parallel_pair("NO");
        let report = inferencer().run(&mut segments, &mut AcceptAll);

        assert_eq!(report.updated_segments, vec![0, 1]);
        assert_eq!(segments[0].multidigit_code, "YES");
        assert_eq!(segments[1].multidigit_code, "YES");

        let a = report.assessments[0].as_ref().unwrap();
        assert_eq!(a.inferred, MultiDigit::Yes);
        assert_eq!(a.valid_neighbors, vec![1]);
        // Stored NO is never an exception
        assert!(!a.legitimate_exception);
    }

    #[test]
    fn test_parallel_pair_already_flagged() {
        let mut segments = parallel_pair("y");
        let report = inferencer().run(&mut segments, &mut AcceptAll);
        assert!(!report.has_changes());
        assert_eq!(segments[0].multidigit_code, "y");
        assert_eq!(
            report.exception_flags(),
            vec![MultiDigit::Yes, MultiDigit::Yes]
        );
    }

    #[test]
    fn test_isolated_segment_demoted() {
        let mut segments = vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 30.0, y: 0.0)]))
                .with_multidigit("YES"),
            Segment::new("2", Some(line_string![(x: 0.0, y: 500.0), (x: 30.0, y: 500.0)]))
                .with_multidigit("NO"),
        ];
        let report = inferencer().run(&mut segments, &mut AcceptAll);

        assert_eq!(report.updated_segments, vec![0]);
        assert_eq!(segments[0].multidigit_code, "NO");
        assert_eq!(report.exception_flags()[0], MultiDigit::No);
        let demoted: Vec<usize> = report.demotion_candidates().map(|a| a.index).collect();
        assert_eq!(demoted, vec![0]);
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let mut segments = parallel_pair("garbage");
        segments.push(
            Segment::new("3", Some(line_string![(x: 200.0, y: 0.0), (x: 260.0, y: 5.0)]))
                .with_multidigit("Y"),
        );
        let first = inferencer().run(&mut segments, &mut AcceptAll);
        assert_eq!(first.updated_segments, vec![0, 1, 2]);

        let second = inferencer().run(&mut segments, &mut AcceptAll);
        assert!(second.updated_segments.is_empty());
    }

    #[test]
    fn test_short_segment_skipped() {
        let mut segments = vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)]))
                .with_multidigit("maybe"),
            Segment::new("2", Some(line_string![(x: 0.0, y: 3.0), (x: 30.0, y: 3.0)]))
                .with_multidigit("YES"),
        ];
        let report = inferencer().run(&mut segments, &mut AcceptAll);
        assert!(report.assessments[0].is_none());
        assert_eq!(segments[0].multidigit_code, "maybe");
        // The long one still sees the short one as a neighbor
        assert_eq!(
            report.assessments[1].as_ref().unwrap().valid_neighbors,
            vec![0]
        );
    }

    #[test]
    fn test_degenerate_geometry_skipped() {
        let mut segments = vec![
            Segment::new("1", None).with_multidigit("YES"),
            Segment::new("2", Some(line_string![(x: 0.0, y: 0.0)])).with_multidigit("YES"),
        ];
        let report = inferencer().run(&mut segments, &mut AcceptAll);
        assert!(report.assessments.iter().all(Option::is_none));
        assert!(!report.has_changes());
    }

    #[test]
    fn test_same_link_not_a_neighbor() {
        let mut segments = parallel_pair("NO");
        segments[1].link_id = "1".to_string();
        let report = inferencer().run(&mut segments, &mut AcceptAll);
        assert!(!report.has_changes());
    }

    #[test]
    fn test_missing_link_ids_still_neighbors() {
        let mut segments = parallel_pair("NO");
        segments[0].link_id.clear();
        segments[1].link_id.clear();
        let report = inferencer().run(&mut segments, &mut AcceptAll);
        assert_eq!(report.updated_segments, vec![0, 1]);
    }

    #[test]
    fn test_perpendicular_not_a_neighbor() {
        let segments = vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 30.0, y: 0.0)])),
            Segment::new("2", Some(line_string![(x: 15.0, y: -15.0), (x: 15.0, y: 15.0)])),
        ];
        let assessments = inferencer().assess(&segments);
        assert_eq!(assessments[0].as_ref().unwrap().inferred, MultiDigit::No);
    }

    #[test]
    fn test_far_parallel_not_a_neighbor() {
        // Parallel but 30 units apart: outside the buffer
        let segments = vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 30.0, y: 0.0)])),
            Segment::new("2", Some(line_string![(x: 0.0, y: 30.0), (x: 30.0, y: 30.0)])),
        ];
        let assessments = inferencer().assess(&segments);
        assert_eq!(assessments[0].as_ref().unwrap().inferred, MultiDigit::No);
    }

    #[test]
    fn test_overlap_rescues_distant_centroid() {
        // Centroids 35 apart, but the lines share 20 units of roadway
        let segments = vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 50.0, y: 0.0)])),
            Segment::new("2", Some(line_string![(x: 30.0, y: 0.0), (x: 100.0, y: 0.0)])),
        ];
        let inf = inferencer();
        let score = inf.score(&segments[0], (1, &segments[1])).unwrap();
        assert!((score.overlap_ratio - 0.4).abs() < 1e-9);
        assert!(score.centroid_distance >= 25.0);
        assert!(score.is_valid(inf.config()));
    }

    #[test]
    fn test_rejected_corrections_kept() {
        let mut segments = parallel_pair("NO");
        let report = inferencer().run(&mut segments, &mut RejectAll);
        assert!(!report.has_changes());
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(segments[0].multidigit_code, "NO");
    }

    #[test]
    fn test_overlap_length() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)];
        let b = line_string![(x: 5.0, y: 0.0), (x: 20.0, y: 0.0)];
        assert!((overlap_length(&a, &b) - 5.0).abs() < 1e-9);

        let crossing = line_string![(x: 5.0, y: -5.0), (x: 5.0, y: 5.0)];
        assert_eq!(overlap_length(&a, &crossing), 0.0);
    }

    #[test]
    fn test_short_exception_not_legitimate() {
        // Length 8: long enough to assess, too short to be an exception
        let mut segments = vec![
            Segment::new("1", Some(line_string![(x: 0.0, y: 0.0), (x: 8.0, y: 0.0)]))
                .with_multidigit("YES"),
            Segment::new("2", Some(line_string![(x: 0.0, y: 6.0), (x: 8.0, y: 6.0)]))
                .with_multidigit("YES"),
        ];
        let report = inferencer().run(&mut segments, &mut AcceptAll);
        assert!(!report.has_changes());
        assert_eq!(report.exception_flags()[0], MultiDigit::No);
    }
}
