//! Spatial index for neighbor segment lookups.

use geo::BoundingRect;
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::models::Segment;

/// Envelope of one segment, keyed by its position in the dataset
#[derive(Debug, Clone)]
struct IndexedSegment {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over segment bounding boxes.
///
/// Only a prefilter: callers still run the exact distance test on the
/// candidates it returns.
pub struct SegmentIndex {
    tree: RTree<IndexedSegment>,
}

impl SegmentIndex {
    /// Build the index; segments without geometry are left out
    pub fn build(segments: &[Segment]) -> Self {
        let indexed: Vec<IndexedSegment> = segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| {
                let rect = segment.geometry.as_ref()?.bounding_rect()?;
                Some(IndexedSegment {
                    index,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        debug!("Segment index built with {} entries", tree.size());

        Self { tree }
    }

    /// Indices of segments whose envelope comes within `radius` of the
    /// envelope of `segment`. Includes `segment` itself if it was indexed.
    pub fn candidates(&self, segment: &Segment, radius: f64) -> Vec<usize> {
        let Some(rect) = segment.geometry.as_ref().and_then(|g| g.bounding_rect()) else {
            return Vec::new();
        };
        let query = AABB::from_corners(
            [rect.min().x - radius, rect.min().y - radius],
            [rect.max().x + radius, rect.max().y + radius],
        );

        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.index)
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
