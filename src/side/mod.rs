//! Declared-vs-geometric side classification.
//!
//! A POI declares its side of the street through its reference percentage;
//! the street geometry implies a side through the cross product of the
//! street chord and the vector to the POI. A disagreement between the two
//! marks the POI for relinking.

use geo::{Coord, LineString};
use serde::Deserialize;

use crate::geometry::side_of_line;
use crate::models::{Poi, Segment, Side, SideVerdict, TravelDirection};

/// Split points for the declared side on the normalized percentage
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SideThresholds {
    /// Below this the POI is on the left
    pub low: f64,
    /// Above this the POI is on the right
    pub high: f64,
}

impl SideThresholds {
    pub const STANDARD: Self = Self {
        low: 0.3,
        high: 0.7,
    };

    /// Only POIs at the very ends of the street count as sided
    pub const STRICT: Self = Self {
        low: 0.01,
        high: 0.99,
    };
}

impl Default for SideThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// How center and unknown sides feed into the relink verdict.
///
/// Both policies produce identical verdicts: a relink needs two lateral
/// sides that differ. They differ only in how the rule is evaluated and
/// are kept as separately named profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelinkPolicy {
    /// Relink iff both sides are L/R and differ
    #[default]
    LateralOnly,
    /// Any center/unknown side is ok; otherwise relink on mismatch
    AmbiguousOk,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    pub thresholds: SideThresholds,
    pub relink_policy: RelinkPolicy,
    /// Use the travel direction when computing the geometric side for the
    /// relink verdict
    pub direction_aware: bool,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            thresholds: SideThresholds::STANDARD,
            relink_policy: RelinkPolicy::LateralOnly,
            direction_aware: false,
        }
    }
}

/// Side a POI claims from its normalized reference percentage
pub fn declared_side(percent: Option<f64>, thresholds: SideThresholds) -> Side {
    match percent {
        None => Side::Unknown,
        Some(p) if p.is_nan() => Side::Unknown,
        Some(p) if p < thresholds.low => Side::Left,
        Some(p) if p > thresholds.high => Side::Right,
        Some(_) => Side::Center,
    }
}

/// Side implied by geometry. Missing point or degenerate line is unknown.
pub fn geometric_side(point: Option<Coord<f64>>, line: Option<&LineString<f64>>) -> Side {
    match (point, line) {
        (Some(point), Some(line)) if line.0.len() >= 2 => side_of_line(point, line),
        _ => Side::Unknown,
    }
}

/// Geometric side honoring the travel direction.
///
/// Backward travel reverses the line before the test. Streets without a
/// travel direction, and degenerate input, yield center.
pub fn directional_side(
    point: Option<Coord<f64>>,
    line: Option<&LineString<f64>>,
    direction: TravelDirection,
) -> Side {
    let (Some(point), Some(line)) = (point, line) else {
        return Side::Center;
    };
    if line.0.len() < 2 || direction.is_undirected() {
        return Side::Center;
    }

    match direction {
        TravelDirection::Backward => {
            let reversed = LineString::new(line.0.iter().rev().copied().collect());
            side_of_line(point, &reversed)
        }
        _ => side_of_line(point, line),
    }
}

/// Relink when declared and geometric sides are both lateral and disagree
pub fn side_verdict(declared: Side, geometric: Side, policy: RelinkPolicy) -> SideVerdict {
    let relink = match policy {
        RelinkPolicy::LateralOnly => {
            declared.is_lateral() && geometric.is_lateral() && declared != geometric
        }
        RelinkPolicy::AmbiguousOk => {
            if matches!(declared, Side::Center | Side::Unknown)
                || matches!(geometric, Side::Center | Side::Unknown)
            {
                false
            } else {
                declared != geometric
            }
        }
    };

    if relink {
        SideVerdict::Relink
    } else {
        SideVerdict::Ok
    }
}

/// Derived side fields for a single POI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideClassification {
    pub declared: Side,
    pub geometric: Side,
    pub verdict: SideVerdict,
    /// Direction-aware geometric side, used against the stored side code
    pub directional: Side,
}

impl SideClassification {
    /// A stored `POI_ST_SD` exists and disagrees with the directional side
    pub fn needs_side_update(&self, stored: Option<Side>) -> bool {
        stored.is_some_and(|s| s != self.directional)
    }
}

/// Classifies POIs against their linked street
pub struct SideClassifier {
    config: SideConfig,
}

impl SideClassifier {
    pub fn new(config: SideConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SideConfig {
        &self.config
    }

    /// Classify `poi` located at `point` against `street`.
    ///
    /// A missing street is not an error: the geometric side becomes
    /// unknown and the verdict ok.
    pub fn classify(
        &self,
        poi: &Poi,
        point: Option<Coord<f64>>,
        street: Option<&Segment>,
    ) -> SideClassification {
        self.classify_against(poi, point, street, street)
    }

    /// Like [`classify`](Self::classify), with the direction-aware side
    /// taken from `nav`, the navigation segment carrying `DIR_TRAVEL`.
    pub fn classify_against(
        &self,
        poi: &Poi,
        point: Option<Coord<f64>>,
        street: Option<&Segment>,
        nav: Option<&Segment>,
    ) -> SideClassification {
        let declared = declared_side(poi.normalized_percent(), self.config.thresholds);
        let line = street.and_then(|s| s.geometry.as_ref());
        let nav_line = nav.and_then(|s| s.geometry.as_ref());
        let direction = nav
            .map(|s| s.travel_direction)
            .unwrap_or(TravelDirection::Blank);

        let directional = directional_side(point, nav_line, direction);
        let geometric = if self.config.direction_aware {
            directional
        } else {
            geometric_side(point, line)
        };

        SideClassification {
            declared,
            geometric,
            verdict: side_verdict(declared, geometric, self.config.relink_policy),
            directional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, line_string};

    fn street() -> Segment {
        Segment::new("100", Some(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]))
            .with_direction(TravelDirection::Both)
    }

    fn poi(percent: f64) -> Poi {
        let mut poi = Poi::new("1", "100");
        poi.percent_from_ref = Some(percent);
        poi
    }

    #[test]
    fn test_declared_side_partition() {
        let t = SideThresholds::STANDARD;
        assert_eq!(declared_side(None, t), Side::Unknown);
        assert_eq!(declared_side(Some(0.0), t), Side::Left);
        assert_eq!(declared_side(Some(0.29), t), Side::Left);
        assert_eq!(declared_side(Some(0.3), t), Side::Center);
        assert_eq!(declared_side(Some(0.5), t), Side::Center);
        assert_eq!(declared_side(Some(0.7), t), Side::Center);
        assert_eq!(declared_side(Some(0.71), t), Side::Right);
        assert_eq!(declared_side(Some(1.0), t), Side::Right);
    }

    #[test]
    fn test_declared_side_monotonic() {
        let order = |s: Side| match s {
            Side::Left => 0,
            Side::Center => 1,
            Side::Right => 2,
            Side::Unknown => panic!("unexpected unknown"),
        };
        for t in [SideThresholds::STANDARD, SideThresholds::STRICT] {
            let mut last = 0;
            for i in 0..=1000 {
                let rank = order(declared_side(Some(i as f64 / 1000.0), t));
                assert!(rank >= last);
                last = rank;
            }
        }
    }

    #[test]
    fn test_strict_thresholds() {
        let t = SideThresholds::STRICT;
        assert_eq!(declared_side(Some(0.005), t), Side::Left);
        assert_eq!(declared_side(Some(0.2), t), Side::Center);
        assert_eq!(declared_side(Some(0.995), t), Side::Right);
    }

    #[test]
    fn test_scenario_left_agrees() {
        let classifier = SideClassifier::new(SideConfig::default());
        let c = classifier.classify(&poi(200.0), Some(coord! { x: 5.0, y: 5.0 }), Some(&street()));
        assert_eq!(c.declared, Side::Left);
        assert_eq!(c.geometric, Side::Left);
        assert_eq!(c.verdict, SideVerdict::Ok);
    }

    #[test]
    fn test_scenario_right_agrees() {
        let classifier = SideClassifier::new(SideConfig::default());
        let c = classifier.classify(&poi(800.0), Some(coord! { x: 5.0, y: -5.0 }), Some(&street()));
        assert_eq!(c.declared, Side::Right);
        assert_eq!(c.geometric, Side::Right);
        assert_eq!(c.verdict, SideVerdict::Ok);
    }

    #[test]
    fn test_scenario_mismatch_relinks() {
        let classifier = SideClassifier::new(SideConfig::default());
        let c = classifier.classify(&poi(800.0), Some(coord! { x: 5.0, y: 5.0 }), Some(&street()));
        assert_eq!(c.declared, Side::Right);
        assert_eq!(c.geometric, Side::Left);
        assert_eq!(c.verdict, SideVerdict::Relink);
    }

    #[test]
    fn test_missing_street() {
        let classifier = SideClassifier::new(SideConfig::default());
        let c = classifier.classify(&poi(800.0), Some(coord! { x: 5.0, y: 5.0 }), None);
        assert_eq!(c.geometric, Side::Unknown);
        assert_eq!(c.verdict, SideVerdict::Ok);
    }

    #[test]
    fn test_degenerate_street() {
        assert_eq!(
            geometric_side(Some(coord! { x: 1.0, y: 1.0 }), Some(&line_string![(x: 0.0, y: 0.0)])),
            Side::Unknown
        );
        assert_eq!(geometric_side(None, Some(&street().geometry.unwrap())), Side::Unknown);
    }

    #[test]
    fn test_policies_agree() {
        let sides = [Side::Left, Side::Right, Side::Center, Side::Unknown];
        for declared in sides {
            for geometric in sides {
                assert_eq!(
                    side_verdict(declared, geometric, RelinkPolicy::LateralOnly),
                    side_verdict(declared, geometric, RelinkPolicy::AmbiguousOk),
                );
            }
        }
        assert_eq!(
            side_verdict(Side::Left, Side::Right, RelinkPolicy::AmbiguousOk),
            SideVerdict::Relink
        );
        assert_eq!(
            side_verdict(Side::Center, Side::Right, RelinkPolicy::LateralOnly),
            SideVerdict::Ok
        );
    }

    #[test]
    fn test_directional_side() {
        let line = street().geometry.unwrap();
        let p = Some(coord! { x: 5.0, y: 5.0 });
        assert_eq!(directional_side(p, Some(&line), TravelDirection::Forward), Side::Left);
        assert_eq!(directional_side(p, Some(&line), TravelDirection::Both), Side::Left);
        assert_eq!(directional_side(p, Some(&line), TravelDirection::Backward), Side::Right);
        assert_eq!(directional_side(p, Some(&line), TravelDirection::None), Side::Center);
        assert_eq!(directional_side(p, Some(&line), TravelDirection::Blank), Side::Center);
        assert_eq!(directional_side(p, None, TravelDirection::Forward), Side::Center);
    }

    #[test]
    fn test_direction_aware_verdict() {
        let classifier = SideClassifier::new(SideConfig {
            direction_aware: true,
            ..SideConfig::default()
        });
        let backward = street().with_direction(TravelDirection::Backward);
        let c = classifier.classify(&poi(800.0), Some(coord! { x: 5.0, y: 5.0 }), Some(&backward));
        assert_eq!(c.geometric, Side::Right);
        assert_eq!(c.verdict, SideVerdict::Ok);
    }

    #[test]
    fn test_needs_side_update() {
        let classifier = SideClassifier::new(SideConfig::default());
        let c = classifier.classify(&poi(500.0), Some(coord! { x: 5.0, y: 5.0 }), Some(&street()));
        assert!(!c.needs_side_update(None));
        assert!(!c.needs_side_update(Some(Side::Left)));
        assert!(c.needs_side_update(Some(Side::Right)));
    }

    #[test]
    fn test_directional_side_from_nav_segment() {
        let classifier = SideClassifier::new(SideConfig::default());
        let naming = Segment::new("100", Some(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]));
        let nav = street().with_direction(TravelDirection::Backward);

        let c = classifier.classify_against(
            &poi(200.0),
            Some(coord! { x: 5.0, y: 5.0 }),
            Some(&naming),
            Some(&nav),
        );
        assert_eq!(c.geometric, Side::Left);
        assert_eq!(c.directional, Side::Right);
    }
}
