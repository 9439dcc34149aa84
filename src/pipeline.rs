//! One validation pass: side classification, multi-digit inference and
//! the merged per-POI verdict.

use geo::{Centroid, Coord};
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{MultiDigit, MultiDigitVerdict, Poi, PoiResult, Segment, SideVerdict};
use crate::multidigit::{InferenceReport, MultiDigitConfig, MultiDigitInferencer, VerdictPolicy};
use crate::review::Reviewer;
use crate::side::SideClassifier;

/// Lookup from link id to position in a segment list. First one wins.
pub fn link_index(segments: &[Segment]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        index.entry(segment.link_id.as_str()).or_insert(i);
    }
    index
}

/// Per-POI multi-digit verdict from the stored flag of its street.
///
/// `stored` is the flag as loaded, before any correction.
pub fn multidigit_verdict(
    stored: MultiDigit,
    exception: MultiDigit,
    length: f64,
    config: &MultiDigitConfig,
) -> MultiDigitVerdict {
    if !stored.is_yes() {
        return MultiDigitVerdict::Ok;
    }
    let delete = match config.verdict_policy {
        VerdictPolicy::ExceptionAware => !exception.is_yes(),
        VerdictPolicy::LongSegment => length >= config.long_segment_length,
    };
    if delete {
        MultiDigitVerdict::Delete
    } else {
        MultiDigitVerdict::Ok
    }
}

/// Everything a pass produces
#[derive(Debug)]
pub struct ValidationOutcome {
    pub results: Vec<PoiResult>,
    pub inference: InferenceReport,
}

impl ValidationOutcome {
    /// POIs that failed both checks
    pub fn fully_invalid(&self) -> impl Iterator<Item = &PoiResult> {
        self.results.iter().filter(|r| r.invalid)
    }

    pub fn relink_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.eval_side == SideVerdict::Relink)
            .count()
    }
}

pub struct Validator {
    classifier: SideClassifier,
    inferencer: MultiDigitInferencer,
}

impl Validator {
    pub fn new(config: &Config) -> Self {
        Self {
            classifier: SideClassifier::new(config.side.clone()),
            inferencer: MultiDigitInferencer::new(config.multidigit.clone()),
        }
    }

    /// Run the whole pass.
    ///
    /// `streets` carries the multiply-digitized flags and is corrected in
    /// place. `sides` supplies the geometry POIs are classified against;
    /// when absent `streets` is used for that too.
    pub fn run(
        &self,
        pois: &[Poi],
        streets: &mut [Segment],
        sides: Option<&[Segment]>,
        reviewer: &mut dyn Reviewer,
    ) -> ValidationOutcome {
        let stored: Vec<MultiDigit> = streets.iter().map(Segment::multidigit).collect();
        let lengths: Vec<f64> = streets.iter().map(Segment::length).collect();

        let side_results = {
            let side_segments: &[Segment] = sides.unwrap_or(&*streets);
            self.classify_sides_against(pois, side_segments, &*streets)
        };

        let inference = self.inferencer.run(streets, reviewer);
        let exceptions = inference.exception_flags();
        let links = link_index(streets);

        let results: Vec<PoiResult> = pois
            .iter()
            .zip(side_results)
            .map(|(poi, mut result)| {
                result.eval_multidigit = match links.get(poi.link_id.as_str()) {
                    Some(&i) => multidigit_verdict(
                        stored[i],
                        exceptions[i],
                        lengths[i],
                        self.inferencer.config(),
                    ),
                    None => MultiDigitVerdict::Ok,
                };
                result.invalid = result.is_fully_invalid();
                result
            })
            .collect();

        let outcome = ValidationOutcome { results, inference };
        info!(
            "Validated {} POIs: {} relink, {} fully invalid",
            outcome.results.len(),
            outcome.relink_count(),
            outcome.fully_invalid().count()
        );
        outcome
    }

    /// Side fields for every POI. Multi-digit fields are left at ok.
    pub fn classify_sides(&self, pois: &[Poi], segments: &[Segment]) -> Vec<PoiResult> {
        self.classify_sides_against(pois, segments, segments)
    }

    /// Side fields with geometric sides from `segments` and the
    /// direction-aware side from the navigation layer `nav`.
    pub fn classify_sides_against(
        &self,
        pois: &[Poi],
        segments: &[Segment],
        nav: &[Segment],
    ) -> Vec<PoiResult> {
        let links = link_index(segments);
        let nav_links = link_index(nav);

        pois.iter()
            .map(|poi| {
                let street = links.get(poi.link_id.as_str()).map(|&i| &segments[i]);
                if street.is_none() {
                    debug!("POI {} links to unknown street {}", poi.id, poi.link_id);
                }
                let nav_street = nav_links.get(poi.link_id.as_str()).map(|&i| &nav[i]);
                let point = poi
                    .location
                    .or_else(|| street.and_then(street_centroid))
                    .or_else(|| nav_street.and_then(street_centroid));
                let c = self.classifier.classify_against(poi, point, street, nav_street);

                PoiResult {
                    poi_id: poi.id.clone(),
                    poi_name: poi.name.clone(),
                    declared_side: c.declared,
                    geometric_side: c.geometric,
                    eval_side: c.verdict,
                    eval_multidigit: MultiDigitVerdict::Ok,
                    invalid: false,
                    needs_side_update: c.needs_side_update(poi.stored_side),
                }
            })
            .collect()
    }
}

/// Stand-in location for POIs that only carry a link reference
pub fn street_centroid(segment: &Segment) -> Option<Coord<f64>> {
    segment.geometry.as_ref()?.centroid().map(|p| p.0)
}
