//! R-tree over detection positions for the clustering neighbour query

use geo::Coord;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::core_types::Detection;

/// A detection position tagged with its slot in the clustering input
#[derive(Debug, Clone, Copy)]
struct IndexedDetection {
    idx: usize,
    x: f64,
    y: f64,
}

impl RTreeObject for IndexedDetection {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for IndexedDetection {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index answering "which detections lie within r of here"
pub struct DetectionIndex {
    tree: RTree<IndexedDetection>,
}

impl DetectionIndex {
    /// Bulk-load the index; slot `i` refers to `detections[i]`
    pub fn build(detections: &[Detection]) -> Self {
        let indexed: Vec<IndexedDetection> = detections
            .iter()
            .enumerate()
            .map(|(idx, d)| IndexedDetection {
                idx,
                x: d.position.x,
                y: d.position.y,
            })
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    /// Slots within `radius` of `center`, ascending.
    ///
    /// The query radius is padded by a relative epsilon so that squared
    /// comparisons never drop a boundary candidate; callers re-check the
    /// exact distance.
    pub fn within(&self, center: Coord<f64>, radius: f64) -> Vec<usize> {
        let padded = radius * (1.0 + 1e-9);
        let mut slots: Vec<usize> = self
            .tree
            .locate_within_distance([center.x, center.y], padded * padded)
            .map(|entry| entry.idx)
            .collect();
        slots.sort_unstable();
        slots
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_radius_query_is_inclusive_and_sorted() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let detections = vec![
            Detection::new(1, date, 1000.0, 0.0),
            Detection::new(2, date, 0.0, 0.0),
            Detection::new(3, date, 1000.1, 0.0),
            Detection::new(4, date, 0.0, -600.0),
        ];
        let index = DetectionIndex::build(&detections);

        assert_eq!(index.len(), 4);
        assert_eq!(index.within(Coord { x: 0.0, y: 0.0 }, 1000.0), vec![0, 1, 3]);
    }

    #[test]
    fn test_empty_index() {
        let index = DetectionIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.within(Coord { x: 0.0, y: 0.0 }, 10.0).is_empty());
    }
}
