//! Closed polygon boundary.

use super::{BoundingBox, Point};
use crate::{CoordF, SCALING_FACTOR};
use serde::{Deserialize, Serialize};

/// A closed polygon described by its vertices.
///
/// The closing edge from the last vertex back to the first is implicit;
/// the first vertex is not repeated at the end. Counter-clockwise winding
/// encodes an exterior boundary, clockwise a hole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

/// A collection of polygons.
pub type Polygons = Vec<Polygon>;

impl Polygon {
    /// Create an empty polygon.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polygon from a list of vertices.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Get the vertices.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Twice the signed area in scaled units squared (shoelace formula).
    ///
    /// Positive for counter-clockwise winding, negative for clockwise.
    pub fn signed_area2(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum: f64 = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
        }
        sum
    }

    /// Signed area in square millimeters.
    pub fn signed_area_mm2(&self) -> CoordF {
        self.signed_area2() / 2.0 / (SCALING_FACTOR * SCALING_FACTOR)
    }

    /// Absolute area in square millimeters.
    #[inline]
    pub fn area_mm2(&self) -> CoordF {
        self.signed_area_mm2().abs()
    }

    /// Whether the polygon winds counter-clockwise.
    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area2() > 0.0
    }

    /// Reverse the winding direction in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Ensure counter-clockwise winding.
    pub fn make_ccw(&mut self) {
        if !self.is_ccw() && self.points.len() >= 3 {
            self.reverse();
        }
    }

    /// Ensure clockwise winding.
    pub fn make_cw(&mut self) {
        if self.is_ccw() {
            self.reverse();
        }
    }

    /// Test whether a point lies inside the polygon (ray casting).
    ///
    /// Points exactly on the boundary may be classified either way.
    pub fn contains_point(&self, p: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) as f64 / (b.y - a.y) as f64;
                let x_cross = a.x as f64 + t * (b.x - a.x) as f64;
                if (p.x as f64) < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Axis-aligned bounding box of the vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        for &p in &self.points {
            bbox.include(p);
        }
        bbox
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    fn square(size_mm: f64) -> Polygon {
        let s = scale(size_mm);
        Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(s, 0),
            Point::new(s, s),
            Point::new(0, s),
        ])
    }

    #[test]
    fn test_signed_area() {
        let sq = square(10.0);
        assert!(sq.is_ccw());
        assert!((sq.area_mm2() - 100.0).abs() < 1e-6);

        let mut cw = sq.clone();
        cw.reverse();
        assert!(!cw.is_ccw());
        assert!((cw.signed_area_mm2() + 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_contains_point() {
        let sq = square(10.0);
        assert!(sq.contains_point(Point::from_mm(5.0, 5.0)));
        assert!(!sq.contains_point(Point::from_mm(15.0, 5.0)));
        assert!(!sq.contains_point(Point::from_mm(-1.0, 5.0)));
    }

    #[test]
    fn test_make_ccw() {
        let mut sq = square(10.0);
        sq.reverse();
        assert!(!sq.is_ccw());
        sq.make_ccw();
        assert!(sq.is_ccw());
    }

}
