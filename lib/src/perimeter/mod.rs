//! Wall (perimeter) generation.
//!
//! Walls are generated from the layer outline by repeated inward offsets.
//! The offsets target the extrusion centerline: the outermost wall sits
//! half a line width inside the outline so the laid bead just reaches the
//! surface, and each further wall moves a full line width inward:
//!
//! - `walls[0] = outline inset by line_width / 2`
//! - `walls[k] = outline inset by line_width / 2 + k * line_width`
//!
//! After `wall_count` walls, the remaining `inner_area` (the outline inset
//! by `wall_count * line_width`) is handed to skin detection and infill.
//! An inset that comes back empty ends wall production early for that
//! layer; the condition is reported as a warning, not an error, so thin
//! features degrade gracefully.

use crate::clipper::{shrink, OffsetJoinType};
use crate::geometry::ExPolygons;
use crate::{CoordF, Warning};

/// Walls and the remaining fill area for one layer.
#[derive(Clone, Debug, Default)]
pub struct WallResult {
    /// Wall centerline rings, outermost first. May hold fewer than the
    /// requested count when the geometry runs out.
    pub walls: Vec<ExPolygons>,
    /// Area enclosed by the innermost wall; empty for features too thin
    /// to have an interior.
    pub inner_area: ExPolygons,
}

impl WallResult {
    /// Whether any wall ring was produced.
    pub fn has_walls(&self) -> bool {
        self.walls.iter().any(|w| !w.is_empty())
    }
}

/// Generate the wall rings and inner area for one layer outline.
///
/// `wall_count` comes from the job settings and is at least one. Empty
/// offsets append a [`Warning::WallOffsetEmpty`] and stop; the inner area
/// is then empty as well.
pub fn generate_walls(
    outline: &ExPolygons,
    line_width: CoordF,
    wall_count: u32,
    layer: usize,
    warnings: &mut Vec<Warning>,
) -> WallResult {
    let mut result = WallResult::default();
    if outline.is_empty() {
        return result;
    }

    for k in 0..wall_count {
        let inset = line_width / 2.0 + k as CoordF * line_width;
        let ring = shrink(outline, inset, OffsetJoinType::Miter);
        if ring.is_empty() {
            warnings.push(Warning::WallOffsetEmpty {
                layer,
                wall: k as usize,
            });
            log::debug!("layer {}: wall {} vanished, feature too thin", layer, k);
            return result;
        }
        result.walls.push(ring);
    }

    result.inner_area = shrink(
        outline,
        wall_count as CoordF * line_width,
        OffsetJoinType::Miter,
    );
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
    fn test_two_walls_on_square() {
        let outline = square_mm(20.0);
        let mut warnings = Vec::new();
        let result = generate_walls(&outline, 0.4, 2, 0, &mut warnings);

        assert_eq!(result.walls.len(), 2);
        assert!(warnings.is_empty());

        // Centerline of the outer wall: 20 - 2*0.2 = 19.6mm square
        let outer_area: f64 = result.walls[0].iter().map(|e| e.area_mm2()).sum();
        assert!((outer_area - 19.6 * 19.6).abs() < 0.5);

        // Inner area: 20 - 2*0.8 = 18.4mm square
        let inner_area: f64 = result.inner_area.iter().map(|e| e.area_mm2()).sum();
        assert!((inner_area - 18.4 * 18.4).abs() < 0.5);
    }

    #[test]
    fn test_thin_feature_stops_early() {
        // A 1.2mm pillar fits one 0.4mm wall ring (centerline at 0.2mm in),
        // the second ring at 0.6mm in has nothing left.
        let outline = square_mm(1.2);
        let mut warnings = Vec::new();
        let result = generate_walls(&outline, 0.4, 3, 7, &mut warnings);

        assert!(result.walls.len() < 3);
        assert!(result.has_walls());
        assert!(warnings
            .iter()
            .any(|w| matches!(w, Warning::WallOffsetEmpty { layer: 7, .. })));
        assert!(result.inner_area.is_empty());
    }

    #[test]
    fn test_empty_outline() {
        let mut warnings = Vec::new();
        let result = generate_walls(&Vec::new(), 0.4, 2, 0, &mut warnings);
        assert!(!result.has_walls());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_hole_produces_wall_rings() {
        // A square with a central hole: each wall level has contour + hole rings
        let outer = square_mm(20.0).remove(0);
        let hole = {
            let mut h = Polygon::from_points(vec![
                Point::from_mm(8.0, 8.0),
                Point::from_mm(12.0, 8.0),
                Point::from_mm(12.0, 12.0),
                Point::from_mm(8.0, 12.0),
            ]);
            h.make_cw();
            h
        };
        let outline = vec![ExPolygon::with_holes(outer.contour, vec![hole])];

        let mut warnings = Vec::new();
        let result = generate_walls(&outline, 0.4, 1, 0, &mut warnings);
        assert_eq!(result.walls.len(), 1);
        assert_eq!(result.walls[0][0].holes.len(), 1);
    }
}
