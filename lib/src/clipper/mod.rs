//! Polygon boolean and offset operations.
//!
//! This module wraps the geo-clipper library to provide the boolean
//! operations (union, intersection, difference) and inward/outward offsets
//! the pipeline is built on:
//! - Wall ring insets and the inner fill area
//! - Top/bottom skin differencing against neighbor layers
//! - Brim ring outsets
//! - Support region projection
//!
//! Internally the slicer stores scaled integer coordinates; the wrappers
//! convert to floating-point millimeter geometry at the boundary and back.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::{scale, unscale, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Fixed-point factor handed to the clipper backend.
const CLIPPER_FACTOR: f64 = 1000.0;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    Round,
    /// Mitered corners
    #[default]
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.25),
            OffsetJoinType::Miter => JoinType::Miter(2.0),
        }
    }
}

fn ring_to_geo(polygon: &Polygon) -> LineString<f64> {
    let mut coords: Vec<GeoCoord<f64>> = polygon
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();
    // geo rings carry an explicit closing point
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let exterior = ring_to_geo(&expoly.contour);
    let holes = expoly.holes.iter().map(ring_to_geo).collect();
    GeoPolygon::new(exterior, holes)
}

fn geo_ring_to_polygon(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(scale(c.x), scale(c.y)))
        .collect();
    // Drop the explicit closing point; our Polygon closes implicitly
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::from_points(points)
}

fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let mut contour = geo_ring_to_polygon(geo_poly.exterior());
    contour.make_ccw();
    let holes = geo_poly
        .interiors()
        .iter()
        .map(|ring| {
            let mut hole = geo_ring_to_polygon(ring);
            hole.make_cw();
            hole
        })
        .collect();
    ExPolygon::with_holes(contour, holes)
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi.0.iter().map(geo_to_expolygon).collect()
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Compute the union of two regions.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return clip.to_vec();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let result = expolygons_to_geo_multi(subject)
        .union(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the intersection of two regions.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }

    let result = expolygons_to_geo_multi(subject)
        .intersection(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the difference of two regions (subject minus clip).
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let result = expolygons_to_geo_multi(subject)
        .difference(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset a region by a distance in millimeters.
///
/// Positive delta inflates (grows) the region, negative delta deflates
/// (shrinks) it. An offset that consumes the region entirely returns an
/// empty result.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }

    let result = expolygons_to_geo_multi(expolygons).offset(
        delta,
        join_type.into(),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Shrink (inset) a region by a distance in millimeters.
pub fn shrink(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, -distance.abs(), join_type)
}

/// Grow (outset) a region by a distance in millimeters.
pub fn grow(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, distance.abs(), join_type)
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Remove polygons below a minimum area (in square millimeters).
pub fn remove_small(expolygons: ExPolygons, min_area_mm2: CoordF) -> ExPolygons {
    expolygons
        .into_iter()
        .filter(|expoly| expoly.area_mm2() > min_area_mm2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mm(size: f64, ox: f64, oy: f64) -> ExPolygon {
        ExPolygon::new(Polygon::from_points(vec![
            Point::from_mm(ox, oy),
            Point::from_mm(ox + size, oy),
            Point::from_mm(ox + size, oy + size),
            Point::from_mm(ox, oy + size),
        ]))
    }

    #[test]
    fn test_union_disjoint() {
        let a = vec![square_mm(10.0, 0.0, 0.0)];
        let b = vec![square_mm(10.0, 20.0, 0.0)];
        let result = union(&a, &b);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_union_overlapping() {
        let a = vec![square_mm(10.0, 0.0, 0.0)];
        let b = vec![square_mm(10.0, 5.0, 0.0)];
        let result = union(&a, &b);
        assert_eq!(result.len(), 1);
        let area: f64 = result.iter().map(|e| e.area_mm2()).sum();
        assert!((area - 150.0).abs() < 1.0);
    }

    #[test]
    fn test_intersection() {
        let a = vec![square_mm(10.0, 0.0, 0.0)];
        let b = vec![square_mm(10.0, 5.0, 0.0)];
        let result = intersection(&a, &b);
        let area: f64 = result.iter().map(|e| e.area_mm2()).sum();
        assert!((area - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_difference() {
        let a = vec![square_mm(10.0, 0.0, 0.0)];
        let b = vec![square_mm(10.0, 5.0, 0.0)];
        let result = difference(&a, &b);
        let area: f64 = result.iter().map(|e| e.area_mm2()).sum();
        assert!((area - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_difference_creates_hole() {
        let outer = vec![square_mm(10.0, 0.0, 0.0)];
        let inner = vec![square_mm(2.0, 4.0, 4.0)];
        let result = difference(&outer, &inner);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        assert!((result[0].area_mm2() - 96.0).abs() < 1.0);
    }

    #[test]
    fn test_shrink_and_grow() {
        let region = vec![square_mm(10.0, 0.0, 0.0)];

        let shrunk = shrink(&region, 1.0, OffsetJoinType::Miter);
        assert_eq!(shrunk.len(), 1);
        assert!((shrunk[0].area_mm2() - 64.0).abs() < 1.0);

        let grown = grow(&region, 1.0, OffsetJoinType::Miter);
        assert_eq!(grown.len(), 1);
        assert!((grown[0].area_mm2() - 144.0).abs() < 2.0);
    }

    #[test]
    fn test_shrink_to_nothing() {
        let region = vec![square_mm(2.0, 0.0, 0.0)];
        let shrunk = shrink(&region, 1.5, OffsetJoinType::Miter);
        assert!(shrunk.is_empty());
    }

    #[test]
    fn test_remove_small() {
        let regions = vec![square_mm(10.0, 0.0, 0.0), square_mm(0.1, 20.0, 0.0)];
        let filtered = remove_small(regions, 0.5);
        assert_eq!(filtered.len(), 1);
    }
}
