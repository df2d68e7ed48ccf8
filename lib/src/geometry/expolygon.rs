//! Polygon with holes.

use super::{BoundingBox, Point, Polygon};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A polygon with holes: one exterior contour (counter-clockwise) and any
/// number of interior holes (clockwise).
///
/// This is the flat contour-plus-holes form used throughout the pipeline;
/// all boolean and offset operations consume and produce it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExPolygon {
    /// The exterior contour.
    pub contour: Polygon,
    /// Interior holes.
    pub holes: Vec<Polygon>,
}

/// A collection of polygons with holes, together describing a region.
pub type ExPolygons = Vec<ExPolygon>;

impl ExPolygon {
    /// Create from an exterior contour with no holes.
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    /// Create from an exterior contour and holes.
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    /// Add a hole.
    pub fn add_hole(&mut self, hole: Polygon) {
        self.holes.push(hole);
    }

    /// Whether the exterior contour is degenerate.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.len() < 3
    }

    /// Net area (contour minus holes) in square millimeters.
    pub fn area_mm2(&self) -> CoordF {
        let holes: CoordF = self.holes.iter().map(|h| h.area_mm2()).sum();
        self.contour.area_mm2() - holes
    }

    /// Test whether a point lies inside the region (inside the contour and
    /// outside every hole).
    pub fn contains_point(&self, p: Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    /// Axis-aligned bounding box of the exterior contour.
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Iterate over all rings: the contour first, then each hole.
    pub fn rings(&self) -> impl Iterator<Item = &Polygon> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }
}

/// Test whether a point lies inside any polygon of a region.
pub fn region_contains_point(expolygons: &[ExPolygon], p: Point) -> bool {
    expolygons.iter().any(|e| e.contains_point(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    fn square(size_mm: f64, origin_mm: f64) -> Polygon {
        let s = scale(size_mm);
        let o = scale(origin_mm);
        Polygon::from_points(vec![
            Point::new(o, o),
            Point::new(o + s, o),
            Point::new(o + s, o + s),
            Point::new(o, o + s),
        ])
    }

    #[test]
    fn test_area_with_hole() {
        let expoly = ExPolygon::with_holes(square(10.0, 0.0), vec![square(2.0, 4.0)]);
        assert!((expoly.area_mm2() - 96.0).abs() < 1e-6);
    }

    #[test]
    fn test_contains_point() {
        let expoly = ExPolygon::with_holes(square(10.0, 0.0), vec![square(2.0, 4.0)]);
        // Inside contour, outside hole
        assert!(expoly.contains_point(Point::from_mm(1.0, 1.0)));
        // Inside the hole
        assert!(!expoly.contains_point(Point::from_mm(5.0, 5.0)));
        // Outside entirely
        assert!(!expoly.contains_point(Point::from_mm(20.0, 20.0)));
    }

    #[test]
    fn test_rings_iteration() {
        let expoly = ExPolygon::with_holes(square(10.0, 0.0), vec![square(2.0, 4.0)]);
        assert_eq!(expoly.rings().count(), 2);
    }
}
