//! Top/bottom skin detection.
//!
//! A region of a layer needs solid skin when fewer than `top_layers`
//! (resp. `bottom_layers`) solid layers lie above (below) it. The check is
//! a boolean difference of the layer's inner area against the intersection
//! of the neighboring outlines within the configured window: wherever that
//! intersection does not cover the inner area, the part is near a free
//! surface and gets dense fill.

use crate::clipper::{difference, intersection, union};
use crate::geometry::ExPolygons;

/// Compute the solid-skin region for one layer.
///
/// `outlines` must hold the cross-section outline of every layer of the
/// job; the planner guarantees availability of the whole window before
/// region building starts.
pub fn detect_skin(
    layer_index: usize,
    outlines: &[ExPolygons],
    inner_area: &ExPolygons,
    top_layers: u32,
    bottom_layers: u32,
) -> ExPolygons {
    if inner_area.is_empty() {
        return Vec::new();
    }

    let bottom = skin_one_side(
        inner_area,
        neighbor_window_down(layer_index, bottom_layers, outlines),
    );
    let top = skin_one_side(
        inner_area,
        neighbor_window_up(layer_index, top_layers, outlines),
    );

    // Union the two sides and keep the result inside the inner area.
    let skin = union(&bottom, &top);
    intersection(&skin, inner_area)
}

/// The sparse-infill region: inner area minus skin.
pub fn sparse_region(inner_area: &ExPolygons, skin: &ExPolygons) -> ExPolygons {
    difference(inner_area, skin)
}

/// Outlines of the `count` layers below `layer_index`, or `None` when the
/// window runs past the first layer (everything near the bed is skin).
fn neighbor_window_down(
    layer_index: usize,
    count: u32,
    outlines: &[ExPolygons],
) -> Option<Vec<&ExPolygons>> {
    let count = count as usize;
    if count == 0 {
        return Some(Vec::new()); // zero bottom layers: nothing is bottom skin
    }
    if layer_index < count {
        return None;
    }
    Some(
        (layer_index - count..layer_index)
            .map(|j| &outlines[j])
            .collect(),
    )
}

/// Outlines of the `count` layers above `layer_index`, or `None` when the
/// window runs past the last layer.
fn neighbor_window_up(
    layer_index: usize,
    count: u32,
    outlines: &[ExPolygons],
) -> Option<Vec<&ExPolygons>> {
    let count = count as usize;
    if count == 0 {
        return Some(Vec::new());
    }
    if layer_index + count >= outlines.len() {
        return None;
    }
    Some(
        (layer_index + 1..=layer_index + count)
            .map(|j| &outlines[j])
            .collect(),
    )
}

/// Skin on one side of the layer given the window of neighbor outlines:
/// - `None` window: the layer sits at the job boundary, entire inner area
///   is skin.
/// - Empty window: that side is disabled (zero layers configured).
/// - Otherwise: inner area minus the intersection of all window outlines.
fn skin_one_side(inner_area: &ExPolygons, window: Option<Vec<&ExPolygons>>) -> ExPolygons {
    match window {
        None => inner_area.clone(),
        Some(window) if window.is_empty() => Vec::new(),
        Some(window) => {
            let mut covered: ExPolygons = window[0].clone();
            for outline in &window[1..] {
                if covered.is_empty() {
                    break;
                }
                covered = intersection(&covered, outline);
            }
            difference(inner_area, &covered)
        }
    }
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

    fn area(expolys: &ExPolygons) -> f64 {
        expolys.iter().map(|e| e.area_mm2()).sum()
    }

    #[test]
    fn test_bottom_layers_are_full_skin() {
        // A stack of identical squares; the first `bottom` layers are all skin
        let outlines: Vec<ExPolygons> = (0..10).map(|_| square_mm(10.0)).collect();
        let inner = square_mm(8.0);

        for i in 0..3 {
            let skin = detect_skin(i, &outlines, &inner, 3, 3);
            assert!(
                (area(&skin) - area(&inner)).abs() < 0.5,
                "layer {} should be full skin",
                i
            );
        }
    }

    #[test]
    fn test_middle_layers_have_no_skin() {
        let outlines: Vec<ExPolygons> = (0..10).map(|_| square_mm(10.0)).collect();
        let inner = square_mm(8.0);

        for i in 3..7 {
            let skin = detect_skin(i, &outlines, &inner, 3, 3);
            assert!(area(&skin) < 0.5, "layer {} should have no skin", i);
        }
    }

    #[test]
    fn test_top_layers_are_full_skin() {
        let outlines: Vec<ExPolygons> = (0..10).map(|_| square_mm(10.0)).collect();
        let inner = square_mm(8.0);

        for i in 7..10 {
            let skin = detect_skin(i, &outlines, &inner, 3, 3);
            assert!(
                (area(&skin) - area(&inner)).abs() < 0.5,
                "layer {} should be full skin",
                i
            );
        }
    }

    #[test]
    fn test_zero_layers_disable_skin() {
        let outlines: Vec<ExPolygons> = (0..10).map(|_| square_mm(10.0)).collect();
        let inner = square_mm(8.0);

        let skin = detect_skin(0, &outlines, &inner, 0, 0);
        assert!(skin.is_empty() || area(&skin) < 1e-6);
    }

    #[test]
    fn test_step_creates_partial_skin() {
        // Layers 0-4 are 10mm squares, layers 5-9 shrink to 6mm: layer 4's
        // inner area is only covered by 6mm above, so the rim becomes skin.
        let mut outlines: Vec<ExPolygons> = (0..5).map(|_| square_mm(10.0)).collect();
        outlines.extend((0..5).map(|_| square_mm(6.0)));
        let inner = square_mm(9.0);

        let skin = detect_skin(4, &outlines, &inner, 3, 3);
        let skin_area = area(&skin);
        // Inner 9x9 = 81, covered above 6x6 = 36: the rim 81-36 = 45 is skin
        assert!((skin_area - 45.0).abs() < 1.0, "got {}", skin_area);

        let sparse = sparse_region(&inner, &skin);
        assert!((area(&sparse) - 36.0).abs() < 1.0);
    }
}
