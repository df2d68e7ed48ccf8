//! Bed adhesion: brim generation.
//!
//! A brim is a set of concentric rings printed around the first layer to
//! enlarge its footprint. Rings are centerlines of successive outward
//! offsets of the first-layer outline at `line_width/2`, `3*line_width/2`,
//! and so on, until the requested brim width is covered.

use crate::clipper::{grow, OffsetJoinType};
use crate::geometry::{ExPolygons, Polygons};
use crate::CoordF;

/// Brim rings for the first layer, stored in print order
/// (outermost ring first, walking inward toward the object).
#[derive(Clone, Debug, Default)]
pub struct BrimResult {
    pub rings: Polygons,
}

impl BrimResult {
    /// Number of rings.
    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }
}

/// Generate brim rings around a first-layer outline.
///
/// Only exterior contours receive a brim; holes in the outline keep their
/// clearance so the brim never fuses the part to islands inside it.
pub fn generate_brim(outline: &ExPolygons, brim_width: CoordF, line_width: CoordF) -> BrimResult {
    let mut result = BrimResult::default();
    if outline.is_empty() || brim_width <= 0.0 || line_width <= 0.0 {
        return result;
    }

    let ring_count = (brim_width / line_width).ceil() as usize;

    // Outermost first: the brim prints toward the object so the nozzle
    // finishes next to the first wall.
    for k in (0..ring_count).rev() {
        let offset = line_width / 2.0 + k as CoordF * line_width;
        for expoly in grow(outline, offset, OffsetJoinType::Miter) {
            result.rings.push(expoly.contour);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point, Polygon};

    fn square_mm(size: f64) -> ExPolygons {
        vec![ExPolygon::new(Polygon::from_points(vec![
            Point::from_mm(0.0, 0.0),
            Point::from_mm(size, 0.0),
            Point::from_mm(size, size),
            Point::from_mm(0.0, size),
        ]))]
    }

    #[test]
    fn test_ring_count() {
        // 8mm brim at 0.4mm lines: 20 rings
        let result = generate_brim(&square_mm(20.0), 8.0, 0.4);
        assert_eq!(result.ring_count(), 20);
    }

    #[test]
    fn test_outermost_ring_first() {
        let result = generate_brim(&square_mm(20.0), 2.0, 0.4);
        assert_eq!(result.ring_count(), 5);
        let first = result.rings.first().unwrap().area_mm2();
        let last = result.rings.last().unwrap().area_mm2();
        assert!(first > last, "print order should walk inward");
    }

    #[test]
    fn test_disabled_brim() {
        assert_eq!(generate_brim(&square_mm(20.0), 0.0, 0.4).ring_count(), 0);
        assert_eq!(generate_brim(&Vec::new(), 8.0, 0.4).ring_count(), 0);
    }

    #[test]
    fn test_partial_ring_rounds_up() {
        // 1.0mm of brim at 0.4mm lines needs 3 rings to cover the width
        let result = generate_brim(&square_mm(20.0), 1.0, 0.4);
        assert_eq!(result.ring_count(), 3);
    }
}
