//! The slicing pipeline.
//!
//! [`Slicer::slice`] is the single entry point of the core: it runs the
//! stages strictly in order on one job, owns every intermediate buffer,
//! reports progress through a caller-supplied callback and polls a cancel
//! token at layer boundaries and inside the heavy stages. Fatal errors
//! short-circuit; recoverable conditions are collected as warnings and
//! returned alongside the result.

use crate::adhesion::generate_brim;
use crate::clipper;
use crate::config::{InfillPattern, SeamPosition, SliceSettings, SupportPattern};
use crate::gcode::{GCode, GCodeEmitter, LayerPaths, PathConfig, PathGenerator};
use crate::geometry::{ExPolygon, ExPolygons, Polygon, Polyline};
use crate::infill::{fill_region, FillPattern, InfillConfig};
use crate::mesh::TriangleMesh;
use crate::perimeter::generate_walls;
use crate::slice::{self, surface, LayerPlan, LayerRegions};
use crate::support::SupportGenerator;
use crate::{CoordF, Error, Result, Warning};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The pipeline stage a progress callback refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Mesh validation and bed centering.
    Preparing,
    /// Mesh/plane cross-sectioning.
    Sectioning,
    /// Walls, skin, infill regions, brim, support.
    Regions,
    /// Path synthesis and ordering.
    Paths,
    /// G-code emission.
    Emitting,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Preparing => write!(f, "preparing"),
            PipelineStage::Sectioning => write!(f, "sectioning"),
            PipelineStage::Regions => write!(f, "regions"),
            PipelineStage::Paths => write!(f, "paths"),
            PipelineStage::Emitting => write!(f, "emitting"),
        }
    }
}

/// Cooperative cancellation flag, shareable across threads.
///
/// The pipeline polls the token; firing it makes the running job return
/// [`Error::Cancelled`] promptly and discard all partial results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The output of a successful job.
#[derive(Debug, Clone)]
pub struct SlicedJob {
    /// Ordered per-layer paths (useful for previews).
    pub layers: Vec<LayerPaths>,
    /// The finished G-code program.
    pub gcode: GCode,
}

impl SlicedJob {
    /// Number of layers in the job.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// The slicing engine for one configuration.
#[derive(Debug, Clone)]
pub struct Slicer {
    settings: SliceSettings,
}

impl Slicer {
    /// Create a slicer with the given job settings.
    pub fn new(settings: SliceSettings) -> Self {
        Self { settings }
    }

    /// The job settings.
    pub fn settings(&self) -> &SliceSettings {
        &self.settings
    }

    /// Run the full pipeline on a mesh.
    ///
    /// `progress` receives `(stage, fraction)` updates; it must be cheap
    /// and must not mutate core state. Returns the job result together
    /// with all warnings collected along the way (warnings are returned
    /// even when the job fails).
    pub fn slice<F>(
        &self,
        mesh: &TriangleMesh,
        mut progress: F,
        cancel: &CancelToken,
    ) -> (Result<SlicedJob>, Vec<Warning>)
    where
        F: FnMut(PipelineStage, CoordF),
    {
        let mut warnings = Vec::new();
        let result = self.run(mesh, &mut progress, cancel, &mut warnings);
        (result, warnings)
    }

    fn run<F>(
        &self,
        mesh: &TriangleMesh,
        progress: &mut F,
        cancel: &CancelToken,
        warnings: &mut Vec<Warning>,
    ) -> Result<SlicedJob>
    where
        F: FnMut(PipelineStage, CoordF),
    {
        let s = &self.settings;
        s.validate()?;
        self.note_ignored_parameters(warnings);

        // --- Stage 1: mesh preparation -----------------------------------
        progress(PipelineStage::Preparing, 0.0);
        let mut mesh = mesh.clone();
        let z_max = mesh.center_on_bed((s.bed_size[0], s.bed_size[1], s.bed_size[2]))?;
        progress(PipelineStage::Preparing, 1.0);

        // --- Stage 2: layer planning --------------------------------------
        let plan = LayerPlan::new(s.first_layer_height, s.layer_height, z_max);
        log::debug!("planned {} layers up to z={:.2}", plan.len(), z_max);

        // --- Stage 3: cross-sectioning ------------------------------------
        let outlines = slice::slice_mesh_with(&mesh, plan.elevations(), warnings, |f| {
            progress(PipelineStage::Sectioning, f);
            !cancel.is_cancelled()
        })?;

        if outlines.iter().all(|outline| outline.is_empty()) {
            return Err(Error::EmptyJob);
        }

        // --- Stage 4: support projection ----------------------------------
        let support_regions = if s.support_enabled {
            SupportGenerator::new(s.support_threshold, s.layer_height, s.line_width())
                .generate(&outlines)
        } else {
            vec![Vec::new(); outlines.len()]
        };

        // --- Stages 5-6: regions, path synthesis, ordering ----------------
        let layer_count = plan.len();
        let mut path_generator = PathGenerator::new(PathConfig {
            outer_before_inner: s.outer_before_inner,
            seam_position: s.seam_position,
        });

        let mut layers: Vec<LayerPaths> = Vec::with_capacity(layer_count);
        for i in 0..layer_count {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            progress(PipelineStage::Regions, i as CoordF / layer_count as CoordF);

            let spiral_layer = s.spiralize && (i as u32) >= s.bottom_layers;
            let regions =
                self.build_regions(i, &outlines, &support_regions[i], spiral_layer, warnings);

            let skin_lines = self.synthesize_skin(&regions, i);
            let fill_lines = self.synthesize_fill(&regions, i);
            let support_lines = self.synthesize_support(&regions, i);

            progress(PipelineStage::Paths, i as CoordF / layer_count as CoordF);
            let components: Vec<Polygon> = outlines[i].iter().map(|e| e.contour.clone()).collect();
            let layer = path_generator.generate_layer(
                i,
                plan.z(i),
                plan.thickness(i),
                &components,
                &regions,
                &skin_lines,
                &fill_lines,
                &support_lines,
                spiral_layer,
            );
            log::trace!("layer {}: {:.1}mm of paths", i, layer.total_length_mm());
            layers.push(layer);
        }

        // --- Stage 7: emission ---------------------------------------------
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        progress(PipelineStage::Emitting, 0.0);
        let gcode = GCodeEmitter::new(s).emit(&layers);
        progress(PipelineStage::Emitting, 1.0);

        Ok(SlicedJob { layers, gcode })
    }

    /// Derive the regions of one layer from its outline and neighbors.
    fn build_regions(
        &self,
        layer_index: usize,
        outlines: &[ExPolygons],
        support: &ExPolygons,
        spiral_layer: bool,
        warnings: &mut Vec<Warning>,
    ) -> LayerRegions {
        let s = &self.settings;
        let line_width = s.line_width();
        let outline = &outlines[layer_index];

        if outline.is_empty() {
            return LayerRegions::default();
        }

        if spiral_layer {
            // Vase region: one outermost wall around the largest component,
            // no skin, no infill, no support.
            let ring = clipper::shrink(outline, line_width / 2.0, clipper::OffsetJoinType::Miter);
            let largest = ring.into_iter().max_by(|a, b| {
                a.area_mm2()
                    .partial_cmp(&b.area_mm2())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            return LayerRegions {
                walls: vec![largest
                    .map(|e| vec![ExPolygon::new(e.contour)])
                    .unwrap_or_default()],
                ..Default::default()
            };
        }

        let wall_result =
            generate_walls(outline, line_width, s.wall_count, layer_index, warnings);

        let skin = surface::detect_skin(
            layer_index,
            outlines,
            &wall_result.inner_area,
            s.top_layers,
            s.bottom_layers,
        );
        let sparse = surface::sparse_region(&wall_result.inner_area, &skin);

        let brim = if layer_index == 0 && s.brim_enabled {
            generate_brim(outline, s.brim_width, line_width).rings
        } else {
            Vec::new()
        };

        LayerRegions {
            walls: wall_result.walls,
            inner_area: wall_result.inner_area,
            skin,
            sparse_infill: sparse,
            brim,
            support: support.clone(),
        }
    }

    fn synthesize_skin(&self, regions: &LayerRegions, layer_index: usize) -> Vec<Polyline> {
        let s = &self.settings;
        if regions.skin.is_empty() {
            return Vec::new();
        }
        let line_width = s.line_width();
        let config = InfillConfig {
            pattern: FillPattern::Lines,
            spacing: line_width,
            overlap: s.skin_overlap / 100.0 * line_width,
        };
        fill_region(&regions.skin, &config, layer_index)
    }

    fn synthesize_fill(&self, regions: &LayerRegions, layer_index: usize) -> Vec<Polyline> {
        let s = &self.settings;
        if regions.sparse_infill.is_empty() || s.infill_density <= 0.0 {
            return Vec::new();
        }
        let line_width = s.line_width();
        let config = InfillConfig {
            pattern: match s.infill_pattern {
                InfillPattern::Grid => FillPattern::Grid,
                InfillPattern::Lines => FillPattern::Lines,
                InfillPattern::Honeycomb => FillPattern::Honeycomb,
            },
            spacing: InfillConfig::spacing_for_density(line_width, s.infill_density),
            overlap: s.infill_overlap / 100.0 * line_width,
        };
        fill_region(&regions.sparse_infill, &config, layer_index)
    }

    fn synthesize_support(&self, regions: &LayerRegions, layer_index: usize) -> Vec<Polyline> {
        let s = &self.settings;
        if regions.support.is_empty() || s.support_density <= 0.0 {
            return Vec::new();
        }
        let line_width = s.line_width();
        let config = InfillConfig {
            pattern: match s.support_pattern {
                SupportPattern::Lines => FillPattern::Lines,
                SupportPattern::Grid => FillPattern::Grid,
                SupportPattern::Zigzag => FillPattern::Zigzag,
            },
            spacing: InfillConfig::spacing_for_density(line_width, s.support_density),
            overlap: 0.0,
        };
        fill_region(&regions.support, &config, layer_index)
    }

    /// Record the accepted-but-unapplied parameters for this job.
    fn note_ignored_parameters(&self, warnings: &mut Vec<Warning>) {
        let s = &self.settings;
        if s.seam_position != SeamPosition::Back {
            warnings.push(Warning::ParameterIgnored {
                name: "seam_position",
            });
        }
        if s.support_enabled {
            warnings.push(Warning::ParameterIgnored {
                name: "support_z_distance",
            });
            warnings.push(Warning::ParameterIgnored {
                name: "support_xy_distance",
            });
            if s.support_interface_enabled {
                warnings.push(Warning::ParameterIgnored {
                    name: "support_interface_layers",
                });
            }
        }
    }
}
