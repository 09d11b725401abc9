//! R-tree over footprint bounding boxes
//!
//! Component-collision tests are plain point-in-box containment; the tree only
//! narrows the candidates so that large boards do not scan every footprint.

use super::types::{BoundingBox, FootprintData, Point};
use rstar::{RTree, RTreeObject, AABB};

/// Footprint box wrapper for R-tree indexing
#[derive(Clone, Debug)]
pub struct FootprintBox {
    pub reference: String,
    pub bounds: BoundingBox,
}

impl FootprintBox {
    pub fn new(footprint: &FootprintData) -> Self {
        Self {
            reference: footprint.reference.clone(),
            bounds: footprint.bounds,
        }
    }
}

impl RTreeObject for FootprintBox {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

/// Spatial index of footprint boxes
#[derive(Clone, Debug, Default)]
pub struct FootprintIndex {
    tree: RTree<FootprintBox>,
}

impl FootprintIndex {
    pub fn build(footprints: &[FootprintData]) -> Self {
        let boxes: Vec<FootprintBox> = footprints.iter().map(FootprintBox::new).collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// First footprint whose box contains `p` (edges inclusive)
    pub fn containing(&self, p: Point) -> Option<&FootprintBox> {
        let probe = AABB::from_point([p.x, p.y]);
        self.tree.locate_in_envelope_intersecting(&probe).next()
    }
}
