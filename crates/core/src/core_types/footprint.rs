//! Burn-footprint geometry
//!
//! A footprint is a point, a line, a polygon or a multi-polygon depending on
//! how many detections back it. Every stage works against the capability set
//! on [`Footprint`] (area, centroid, union, difference, intersects, distance)
//! rather than against one concrete shape.
//!
//! Boolean operations only have areal semantics. When one operand is a point
//! or a line, the lower-dimensional operand carries no area, so:
//! - `union` keeps the operand of higher dimension (the later one on ties)
//! - `difference` of an areal footprint by a point/line leaves it unchanged
//! - `difference` of a point/line is empty once the other footprint covers it

use geo::{
    Area, BooleanOps, Centroid, Closest, ClosestPoint, Coord, CoordsIter, Geometry, Intersects,
    Line, LineString, MultiPolygon, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use std::panic::{self, UnwindSafe};

use super::units::{Hectares, Meters};
use crate::error::GeometryError;

/// Areal tolerance in m².
///
/// Boolean results are snapped to an integer grid, so re-deriving the same
/// shape leaves slivers and pin holes of 1e-4 to 1e-2 m² along shared edges.
/// Parts and holes under this area are dropped, and a difference with
/// nothing above it left is empty. A detection pixel covers 10⁵ m² or more.
pub const AREA_TOLERANCE_M2: f64 = 1.0;

/// Estimated burned area of an event on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "geometry", rename_all = "lowercase")]
pub enum Footprint {
    /// Single detection
    Point(Point<f64>),
    /// Hull of two detections
    Line(Line<f64>),
    Polygon(Polygon<f64>),
    #[serde(rename = "multipolygon")]
    MultiPolygon(MultiPolygon<f64>),
}

impl Footprint {
    /// Build an areal footprint from a boolean-op result.
    ///
    /// Parts and holes under [`AREA_TOLERANCE_M2`] are dropped; returns
    /// `None` when nothing with area is left.
    pub fn from_multi_polygon(multi: MultiPolygon<f64>) -> Option<Self> {
        let mut parts: Vec<Polygon<f64>> = multi.into_iter().filter_map(without_artifacts).collect();

        match parts.len() {
            0 => None,
            1 => parts.pop().map(Footprint::Polygon),
            _ => Some(Footprint::MultiPolygon(MultiPolygon::new(parts))),
        }
    }

    /// Union of polygons whose interiors do not overlap, such as the faces of
    /// a triangulation, in a single overlay pass.
    ///
    /// Returns `None` when nothing with area is left.
    ///
    /// # Errors
    /// `NonFinite` for a non-finite vertex, `Degenerate` if the overlay fails.
    pub fn from_tiles(tiles: Vec<Polygon<f64>>) -> Result<Option<Self>, GeometryError> {
        let tiles = MultiPolygon::new(tiles);
        if !tiles.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
            return Err(GeometryError::NonFinite { context: "tile union" });
        }

        // Even-odd filling over edge-sharing tiles dissolves every shared edge
        let nothing = MultiPolygon::<f64>::new(Vec::new());
        let merged = guarded("tile union", || tiles.union(&nothing))?;
        Ok(Footprint::from_multi_polygon(merged))
    }

    /// Interior rings of every areal part
    pub fn hole_count(&self) -> usize {
        match self {
            Footprint::Point(_) | Footprint::Line(_) => 0,
            Footprint::Polygon(p) => p.interiors().len(),
            Footprint::MultiPolygon(mp) => mp.iter().map(|p| p.interiors().len()).sum(),
        }
    }

    /// Geometry name, as persisted
    pub fn kind(&self) -> &'static str {
        match self {
            Footprint::Point(_) => "point",
            Footprint::Line(_) => "line",
            Footprint::Polygon(_) => "polygon",
            Footprint::MultiPolygon(_) => "multipolygon",
        }
    }

    /// Topological dimension (0 point, 1 line, 2 areal)
    pub fn dimension(&self) -> u8 {
        match self {
            Footprint::Point(_) => 0,
            Footprint::Line(_) => 1,
            Footprint::Polygon(_) | Footprint::MultiPolygon(_) => 2,
        }
    }

    /// Polygon or multi-polygon
    pub fn is_areal(&self) -> bool {
        self.dimension() == 2
    }

    /// Planar area in square meters (zero for points and lines)
    pub fn area(&self) -> f64 {
        match self {
            Footprint::Point(_) | Footprint::Line(_) => 0.0,
            Footprint::Polygon(p) => p.unsigned_area(),
            Footprint::MultiPolygon(mp) => mp.unsigned_area(),
        }
    }

    /// Planar area in hectares
    pub fn area_hectares(&self) -> Hectares {
        Hectares::from_square_meters(self.area())
    }

    /// Geometric centroid, `None` for a collapsed areal footprint
    pub fn centroid(&self) -> Option<Point<f64>> {
        match self {
            Footprint::Point(p) => Some(*p),
            Footprint::Line(l) => Some(l.centroid()),
            Footprint::Polygon(p) => p.centroid(),
            Footprint::MultiPolygon(mp) => mp.centroid(),
        }
    }

    /// All vertices, in storage order
    pub fn vertices(&self) -> Vec<Coord<f64>> {
        match self {
            Footprint::Point(p) => p.coords_iter().collect(),
            Footprint::Line(l) => l.coords_iter().collect(),
            Footprint::Polygon(p) => p.coords_iter().collect(),
            Footprint::MultiPolygon(mp) => mp.coords_iter().collect(),
        }
    }

    /// Convert into a plain `geo` geometry
    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Footprint::Point(p) => Geometry::Point(*p),
            Footprint::Line(l) => Geometry::Line(*l),
            Footprint::Polygon(p) => Geometry::Polygon(p.clone()),
            Footprint::MultiPolygon(mp) => Geometry::MultiPolygon(mp.clone()),
        }
    }

    /// Whether this footprint intersects any `geo` shape the four variants
    /// know how to test against
    pub fn intersects_shape<G>(&self, other: &G) -> bool
    where
        Point<f64>: Intersects<G>,
        Line<f64>: Intersects<G>,
        Polygon<f64>: Intersects<G>,
        MultiPolygon<f64>: Intersects<G>,
    {
        match self {
            Footprint::Point(p) => p.intersects(other),
            Footprint::Line(l) => l.intersects(other),
            Footprint::Polygon(p) => p.intersects(other),
            Footprint::MultiPolygon(mp) => mp.intersects(other),
        }
    }

    /// Whether two footprints share at least one point
    pub fn intersects(&self, other: &Footprint) -> bool {
        match other {
            Footprint::Point(p) => self.intersects_shape(p),
            Footprint::Line(l) => self.intersects_shape(l),
            Footprint::Polygon(p) => self.intersects_shape(p),
            Footprint::MultiPolygon(mp) => self.intersects_shape(mp),
        }
    }

    /// Minimum Euclidean distance between two footprints
    pub fn distance(&self, other: &Footprint) -> Meters {
        if self.intersects(other) {
            return Meters::new(0.0);
        }

        // Between disjoint shapes the minimum is reached at a vertex of one of them
        let forward = other.vertices().into_iter().map(|c| self.distance_to(c));
        let backward = self.vertices().into_iter().map(|c| other.distance_to(c));
        Meters::new(forward.chain(backward).fold(f64::INFINITY, f64::min))
    }

    fn distance_to(&self, coord: Coord<f64>) -> f64 {
        let target = Point::from(coord);
        let closest = match self {
            Footprint::Point(p) => p.closest_point(&target),
            Footprint::Line(l) => l.closest_point(&target),
            Footprint::Polygon(p) => p.closest_point(&target),
            Footprint::MultiPolygon(mp) => mp.closest_point(&target),
        };

        match closest {
            Closest::Intersection(_) => 0.0,
            Closest::SinglePoint(q) => (q.x() - target.x()).hypot(q.y() - target.y()),
            Closest::Indeterminate => f64::INFINITY,
        }
    }

    /// Geometric union.
    ///
    /// # Errors
    /// `NonFinite` if either operand carries a non-finite coordinate,
    /// `Degenerate` if the areal boolean operation fails.
    pub fn union(&self, other: &Footprint) -> Result<Footprint, GeometryError> {
        self.ensure_finite("union")?;
        other.ensure_finite("union")?;

        match (self.as_multi_polygon(), other.as_multi_polygon()) {
            (Some(a), Some(b)) => {
                let merged = guarded("union", || a.union(&b))?;
                Footprint::from_multi_polygon(merged).ok_or_else(|| {
                    GeometryError::Degenerate("union of areal footprints has no area".into())
                })
            }
            _ if self.dimension() > other.dimension() => Ok(self.clone()),
            _ => Ok(other.clone()),
        }
    }

    /// Geometric set difference `self − other`, `None` when nothing is left.
    ///
    /// # Errors
    /// Same as [`Footprint::union`].
    pub fn difference(&self, other: &Footprint) -> Result<Option<Footprint>, GeometryError> {
        self.ensure_finite("difference")?;
        other.ensure_finite("difference")?;

        match (self, other) {
            (Footprint::Point(p), _) => Ok((!other.intersects_shape(p)).then(|| self.clone())),
            (Footprint::Line(a), Footprint::Line(b)) => {
                let same = (a.start == b.start && a.end == b.end)
                    || (a.start == b.end && a.end == b.start);
                Ok((!same).then(|| self.clone()))
            }
            (Footprint::Line(l), _) if other.is_areal() => {
                let covered = [l.start, l.end, (l.start + l.end) / 2.0]
                    .iter()
                    .all(|c| other.intersects_shape(&Point::from(*c)));
                Ok((!covered).then(|| self.clone()))
            }
            (Footprint::Line(_), _) => Ok(Some(self.clone())),
            _ => match (self.as_multi_polygon(), other.as_multi_polygon()) {
                (Some(a), Some(b)) => {
                    let remainder = guarded("difference", || a.difference(&b))?;
                    Ok(Footprint::from_multi_polygon(remainder))
                }
                _ => Ok(Some(self.clone())),
            },
        }
    }

    fn as_multi_polygon(&self) -> Option<MultiPolygon<f64>> {
        match self {
            Footprint::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
            Footprint::MultiPolygon(mp) => Some(mp.clone()),
            Footprint::Point(_) | Footprint::Line(_) => None,
        }
    }

    fn ensure_finite(&self, context: &'static str) -> Result<(), GeometryError> {
        if self.vertices().iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
            Ok(())
        } else {
            Err(GeometryError::NonFinite { context })
        }
    }
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), Vec::new()).unsigned_area()
}

/// Strip holes under the tolerance, then the part itself if it is under it
fn without_artifacts(part: Polygon<f64>) -> Option<Polygon<f64>> {
    let (exterior, interiors) = part.into_inner();
    if ring_area(&exterior) <= AREA_TOLERANCE_M2 {
        return None;
    }

    let interiors: Vec<LineString<f64>> = interiors
        .into_iter()
        .filter(|ring| ring_area(ring) > AREA_TOLERANCE_M2)
        .collect();
    let cleaned = Polygon::new(exterior, interiors);
    (cleaned.unsigned_area() > AREA_TOLERANCE_M2).then_some(cleaned)
}

/// Run an areal boolean operation, turning a panic or a non-finite result
/// into a recoverable degeneracy
fn guarded<F>(op: &'static str, f: F) -> Result<MultiPolygon<f64>, GeometryError>
where
    F: FnOnce() -> MultiPolygon<f64> + UnwindSafe,
{
    let result = panic::catch_unwind(f)
        .map_err(|_| GeometryError::Degenerate(format!("{op} aborted on invalid input")))?;

    if result.unsigned_area().is_finite() {
        Ok(result)
    } else {
        Err(GeometryError::Degenerate(format!("{op} produced a non-finite area")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{coord, polygon};

    fn square(x0: f64, y0: f64, side: f64) -> Footprint {
        Footprint::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
        ])
    }

    #[test]
    fn test_area_and_centroid() {
        let sq = square(0.0, 0.0, 100.0);
        assert_relative_eq!(sq.area(), 10_000.0);
        assert_relative_eq!(*sq.area_hectares(), 1.0);

        let c = sq.centroid().unwrap();
        assert_relative_eq!(c.x(), 50.0);
        assert_relative_eq!(c.y(), 50.0);
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let a = square(0.0, 0.0, 100.0);
        let b = square(50.0, 0.0, 100.0);
        let merged = a.union(&b).unwrap();

        assert!(matches!(merged, Footprint::Polygon(_)));
        assert_relative_eq!(merged.area(), 15_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_union_of_disjoint_squares_is_multi() {
        let merged = square(0.0, 0.0, 10.0).union(&square(100.0, 0.0, 10.0)).unwrap();
        assert!(matches!(merged, Footprint::MultiPolygon(_)));
        assert_relative_eq!(merged.area(), 200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_leaves_only_new_growth() {
        let grown = square(0.0, 0.0, 100.0);
        let claimed = square(0.0, 0.0, 50.0);
        let fresh = grown.difference(&claimed).unwrap().unwrap();

        assert_relative_eq!(fresh.area(), 7_500.0, epsilon = 1e-6);
        assert!(grown.difference(&grown).unwrap().is_none());
    }

    #[test]
    fn test_lower_dimension_rules() {
        let sq = square(0.0, 0.0, 100.0);
        let inside = Footprint::Point(Point::new(10.0, 10.0));
        let outside = Footprint::Point(Point::new(500.0, 500.0));

        assert!(inside.difference(&sq).unwrap().is_none());
        assert_eq!(outside.difference(&sq).unwrap(), Some(outside.clone()));
        assert_eq!(sq.difference(&inside).unwrap(), Some(sq.clone()));
        assert_eq!(sq.union(&inside).unwrap(), sq);

        let line = Footprint::Line(Line::new(coord! { x: 10.0, y: 10.0 }, coord! { x: 20.0, y: 20.0 }));
        assert!(line.difference(&sq).unwrap().is_none());
        assert_eq!(line.union(&inside).unwrap(), line);
    }

    #[test]
    fn test_distance_between_footprints() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(20.0, 0.0, 10.0);
        assert_relative_eq!(*a.distance(&b), 10.0);
        assert_relative_eq!(*a.distance(&square(5.0, 5.0, 10.0)), 0.0);

        let p = Footprint::Point(Point::new(13.0, 14.0));
        assert_relative_eq!(*a.distance(&p), 5.0);
    }

    #[test]
    fn test_non_finite_is_not_recoverable() {
        let bad = Footprint::Point(Point::new(f64::NAN, 0.0));
        let err = square(0.0, 0.0, 1.0).union(&bad).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_slivers_are_dropped() {
        let sliver = polygon![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0), (x: 0.0, y: 1e-4)];
        assert!(Footprint::from_multi_polygon(MultiPolygon::new(vec![sliver])).is_none());
    }

    #[test]
    fn test_pin_holes_are_dropped() {
        let part = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
            interiors: [
                [(x: 10.0, y: 10.0), (x: 10.01, y: 10.0), (x: 10.01, y: 10.01), (x: 10.0, y: 10.01)],
                [(x: 50.0, y: 50.0), (x: 60.0, y: 50.0), (x: 60.0, y: 60.0), (x: 50.0, y: 60.0)],
            ],
        );
        let cleaned = Footprint::from_multi_polygon(MultiPolygon::new(vec![part])).unwrap();

        assert_eq!(cleaned.hole_count(), 1);
        assert_relative_eq!(cleaned.area(), 9_900.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tiles_dissolve_into_one_polygon() {
        // Fan of four triangles around an interior vertex
        let centre = coord! { x: 37.3, y: 41.9 };
        let corners = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 90.7, y: 0.0 },
            coord! { x: 90.7, y: 80.3 },
            coord! { x: 0.0, y: 80.3 },
        ];
        let tiles = (0..4)
            .map(|i| geo::Triangle::new(corners[i], corners[(i + 1) % 4], centre).to_polygon())
            .collect();

        let merged = Footprint::from_tiles(tiles).unwrap().unwrap();
        assert!(matches!(merged, Footprint::Polygon(_)));
        assert_eq!(merged.hole_count(), 0);
        assert_relative_eq!(merged.area(), 90.7 * 80.3, max_relative = 1e-6);
    }
}
