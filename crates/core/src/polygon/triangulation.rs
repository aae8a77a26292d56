//! Delaunay triangulation with edge and area caps
//!
//! A plain Delaunay triangulation of scattered detections bridges distant,
//! unrelated hotspots with long thin triangles. Triangles are kept only when
//! their longest edge and their area both stay under the configured caps.

use geo::{Area, Coord, Triangle};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::config::PipelineConfig;
use crate::core_types::{Footprint, AREA_TOLERANCE_M2, SQUARE_METERS_PER_HECTARE};
use crate::error::GeometryError;

/// Caps applied to every Delaunay triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleFilter {
    /// Longest allowed edge (projected units)
    pub max_edge: f64,
    /// Largest allowed area (square projected units)
    pub max_area: f64,
}

impl TriangleFilter {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_edge: config.max_triangle_edge,
            max_area: config.max_triangle_area_ha * SQUARE_METERS_PER_HECTARE,
        }
    }

    /// Whether a triangle survives both caps
    pub fn accepts(&self, triangle: &Triangle<f64>) -> bool {
        longest_edge(triangle) <= self.max_edge && triangle.unsigned_area() <= self.max_area
    }
}

fn longest_edge(triangle: &Triangle<f64>) -> f64 {
    let [a, b, c] = triangle.to_array();
    let edge = |p: Coord<f64>, q: Coord<f64>| (p.x - q.x).hypot(p.y - q.y);
    edge(a, b).max(edge(b, c)).max(edge(c, a))
}

/// Delaunay triangles over `points` that pass `filter`.
///
/// Duplicate points are merged; collinear input yields no triangles.
///
/// # Errors
/// `Degenerate` when the triangulation cannot be built (coordinates out of
/// the representable range).
pub fn filtered_triangles(
    points: &[Coord<f64>],
    filter: &TriangleFilter,
) -> Result<Vec<Triangle<f64>>, GeometryError> {
    let vertices: Vec<Point2<f64>> = points.iter().map(|c| Point2::new(c.x, c.y)).collect();
    let triangulation = DelaunayTriangulation::<Point2<f64>>::bulk_load(vertices)
        .map_err(|e| GeometryError::Degenerate(format!("triangulation failed: {e:?}")))?;

    let triangles = triangulation
        .inner_faces()
        .map(|face| {
            let [a, b, c] = face.vertices().map(|v| {
                let p = v.position();
                Coord { x: p.x, y: p.y }
            });
            Triangle::new(a, b, c)
        })
        .filter(|t| t.unsigned_area() > AREA_TOLERANCE_M2 && filter.accepts(t))
        .collect();

    Ok(triangles)
}

/// Union of the retained triangles, `None` when no triangle survives
///
/// # Errors
/// Propagates triangulation and union failures.
pub fn triangulated_footprint(
    points: &[Coord<f64>],
    filter: &TriangleFilter,
) -> Result<Option<Footprint>, GeometryError> {
    let tiles: Vec<_> = filtered_triangles(points, filter)?
        .into_iter()
        .map(Triangle::to_polygon)
        .collect();

    if tiles.is_empty() {
        return Ok(None);
    }
    Footprint::from_tiles(tiles)
}
