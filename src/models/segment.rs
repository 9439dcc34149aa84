//! Street segment records.

use geo::{Euclidean, Length, LineString};

use super::MultiDigit;

/// Travel direction code (`DIR_TRAVEL`) relative to the reference node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelDirection {
    /// `F`: travel from the reference node, same as digitizing order
    Forward,
    /// `T`: travel towards the reference node, against digitizing order
    Backward,
    /// `B`: two-way street
    Both,
    /// `N`: closed to traffic
    None,
    /// Missing or unrecognized
    Blank,
}

impl TravelDirection {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" => TravelDirection::Forward,
            "T" => TravelDirection::Backward,
            "B" => TravelDirection::Both,
            "N" => TravelDirection::None,
            _ => TravelDirection::Blank,
        }
    }

    /// Without a usable direction the side of a point is ambiguous
    pub fn is_undirected(&self) -> bool {
        matches!(self, TravelDirection::None | TravelDirection::Blank)
    }
}

/// A street segment in the planar frame
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub link_id: String,
    /// Planar geometry; `None` when the source feature was null or not a line
    pub geometry: Option<LineString<f64>>,
    pub travel_direction: TravelDirection,
    /// Raw `MULTIDIGIT` code as loaded
    pub multidigit_code: String,
}

impl Segment {
    pub fn new(link_id: impl Into<String>, geometry: Option<LineString<f64>>) -> Self {
        Self {
            link_id: link_id.into(),
            geometry,
            travel_direction: TravelDirection::Blank,
            multidigit_code: String::new(),
        }
    }

    pub fn with_multidigit(mut self, code: impl Into<String>) -> Self {
        self.multidigit_code = code.into();
        self
    }

    pub fn with_direction(mut self, direction: TravelDirection) -> Self {
        self.travel_direction = direction;
        self
    }

    /// Normalized stored flag
    pub fn multidigit(&self) -> MultiDigit {
        MultiDigit::from_code(&self.multidigit_code)
    }

    /// Planar length; zero for missing geometry
    pub fn length(&self) -> f64 {
        self.geometry
            .as_ref()
            .map(|line| Euclidean.length(line))
            .unwrap_or(0.0)
    }

    /// Geometry with at least two coordinates
    pub fn line(&self) -> Option<&LineString<f64>> {
        self.geometry.as_ref().filter(|line| line.0.len() >= 2)
    }
}
