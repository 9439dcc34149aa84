//! Point-of-interest records and their derived validation results.

use geo::Coord;
use serde::Serialize;

use super::{MultiDigitVerdict, Side, SideVerdict};

/// A POI as loaded from the tabular input
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: String,
    pub name: String,
    /// Reference percentage along the linked street, 0-1000
    pub percent_from_ref: Option<f64>,
    /// Foreign key into the street dataset
    pub link_id: String,
    /// Street side stored in the source data (`POI_ST_SD`)
    pub stored_side: Option<Side>,
    /// Planar (Web Mercator) location, if the source carried one
    pub location: Option<Coord<f64>>,
}

impl Poi {
    pub fn new(id: impl Into<String>, link_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            percent_from_ref: None,
            link_id: link_id.into(),
            stored_side: None,
            location: None,
        }
    }

    /// Reference percentage scaled to 0-1
    pub fn normalized_percent(&self) -> Option<f64> {
        self.percent_from_ref
            .filter(|p| p.is_finite())
            .map(|p| p / 1000.0)
    }
}

/// Output record for a single POI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PoiResult {
    pub poi_id: String,
    pub poi_name: String,
    pub declared_side: Side,
    pub geometric_side: Side,
    pub eval_side: SideVerdict,
    pub eval_multidigit: MultiDigitVerdict,
    /// Failed both the side and the multiply-digitized checks
    pub invalid: bool,
    /// Stored `POI_ST_SD` disagrees with the direction-aware side
    pub needs_side_update: bool,
}

impl PoiResult {
    pub fn is_fully_invalid(&self) -> bool {
        self.eval_multidigit == MultiDigitVerdict::Delete && self.eval_side == SideVerdict::Relink
    }
}
