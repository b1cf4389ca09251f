use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;
use crate::item::LayoutItem;

/// An entry in the R-tree spatial index, referencing an item by its index.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    /// Index into the database's item slice.
    pub item_index: usize,
    /// Bounding box of the item.
    pub bbox: BBox,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index for neighbourhood queries during verification.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load the index from a list of items. Items without geometry are skipped.
    pub fn from_items(items: &[LayoutItem]) -> Self {
        let entries = items
            .iter()
            .enumerate()
            .filter_map(|(item_index, item)| {
                item.bbox().map(|bbox| SpatialEntry { item_index, bbox })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Find all entries whose bounding box intersects `region`.
    pub fn query_region(&self, region: &BBox) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners(
            [region.min.x, region.min.y],
            [region.max.x, region.max.y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
