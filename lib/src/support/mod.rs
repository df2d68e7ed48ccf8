//! Support structure generation.
//!
//! Overhang detection works purely on the stack of layer outlines: the
//! part of a layer that sticks out past a dilation of the layer below it
//! by more than the printable overhang distance needs support. The
//! printable distance follows from the threshold angle:
//!
//! `max_safe_overhang = layer_height / tan(threshold)`
//!
//! Support regions are then projected downward in a single top-down pass:
//! every layer supports the union of all overhangs above it, minus the
//! object itself (columns end where they land on the model or the bed).

use crate::clipper::{difference, grow, remove_small, union, OffsetJoinType};
use crate::geometry::ExPolygons;
use crate::CoordF;

/// Ignore support islands below this area (mm^2); they would print as
/// unattached crumbs.
const MIN_SUPPORT_AREA: CoordF = 0.25;

/// Generates per-layer support regions from the outline stack.
#[derive(Clone, Debug)]
pub struct SupportGenerator {
    /// Overhang threshold angle in degrees (from vertical faces = 90 down
    /// to flat ceilings = 0).
    threshold_angle: CoordF,
    /// Layer height in millimeters.
    layer_height: CoordF,
    /// Extrusion line width in millimeters.
    line_width: CoordF,
}

impl SupportGenerator {
    /// Create a generator for the given job geometry parameters.
    pub fn new(threshold_angle: CoordF, layer_height: CoordF, line_width: CoordF) -> Self {
        Self {
            threshold_angle,
            layer_height,
            line_width,
        }
    }

    /// The horizontal step one layer may overhang the previous one without
    /// support, in millimeters.
    pub fn max_safe_overhang(&self) -> CoordF {
        self.layer_height / self.threshold_angle.to_radians().tan()
    }

    /// The overhang area of layer `upper` relative to the layer below it:
    /// whatever lies outside the safely-printable dilation of the lower
    /// outline.
    fn overhang(&self, upper: &ExPolygons, lower: &ExPolygons) -> ExPolygons {
        if upper.is_empty() {
            return Vec::new();
        }
        let printable = grow(lower, self.max_safe_overhang(), OffsetJoinType::Miter);
        remove_small(difference(upper, &printable), MIN_SUPPORT_AREA)
    }

    /// Compute the support region for every layer.
    ///
    /// The result has the same length as `outlines`; entry `i` is the
    /// region of support material printed at layer `i`.
    pub fn generate(&self, outlines: &[ExPolygons]) -> Vec<ExPolygons> {
        let n = outlines.len();
        let mut regions = vec![Vec::new(); n];
        if n < 2 {
            return regions;
        }

        // Top-down projection: accumulate overhangs, drop them where the
        // object occupies the layer.
        let mut falling: ExPolygons = Vec::new();
        for i in (0..n - 1).rev() {
            let overhang = self.overhang(&outlines[i + 1], &outlines[i]);
            if !overhang.is_empty() {
                // A touch of dilation keeps the support from degenerating
                // into single lines under shallow overhangs.
                let padded = grow(&overhang, self.line_width, OffsetJoinType::Miter);
                falling = union(&falling, &padded);
            }
            if falling.is_empty() {
                continue;
            }
            falling = remove_small(difference(&falling, &outlines[i]), MIN_SUPPORT_AREA);
            regions[i] = falling.clone();
        }

        regions
    }
}
