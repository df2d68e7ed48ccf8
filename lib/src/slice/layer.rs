//! Per-layer region data carried between pipeline stages.

use crate::geometry::{ExPolygons, Polygons};

/// The regions derived from one layer's outline.
///
/// `walls` holds the centerline rings of each wall loop, outermost first;
/// `inner_area` is what remains inside the innermost wall. Skin and sparse
/// infill partition `inner_area`; support is its own per-layer region.
#[derive(Clone, Debug, Default)]
pub struct LayerRegions {
    /// Wall centerline rings, indexed by wall number (0 = outermost).
    pub walls: Vec<ExPolygons>,
    /// Area enclosed by the innermost wall.
    pub inner_area: ExPolygons,
    /// Solid skin (top and bottom unioned), subset of `inner_area`.
    pub skin: ExPolygons,
    /// Sparse infill region: `inner_area` minus `skin`.
    pub sparse_infill: ExPolygons,
    /// Brim centerline rings (first layer only), in print order.
    pub brim: Polygons,
    /// Support region printed on this layer.
    pub support: ExPolygons,
}
