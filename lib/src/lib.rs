//! # Kasynel Slicer
//!
//! The slicing core of Kasynel: converts a watertight triangle mesh plus
//! machine/material/process parameters into a G-code program for a
//! Cartesian FDM printer.
//!
//! The pipeline runs as a fixed sequence of stages, each producing
//! immutable data consumed by the next:
//!
//! 1. Mesh preparation (validation, bed centering)
//! 2. Layer planning (slice elevations)
//! 3. Cross-sectioning (mesh/plane intersection into closed outlines)
//! 4. Region building (walls, top/bottom skin, sparse infill, brim, support)
//! 5. Path synthesis (infill patterns, wall loops)
//! 6. Path ordering (print order, seam placement)
//! 7. G-code emission (motion, extrusion, retraction, temperatures, fan)
//!
//! ## Example
//!
//! ```rust,ignore
//! use kasynel_slicer::{CancelToken, SliceSettings, Slicer, TriangleMesh};
//!
//! let mesh = TriangleMesh::from_stl("model.stl")?;
//! let settings = SliceSettings::default();
//! let slicer = Slicer::new(settings);
//! let (result, warnings) = slicer.slice(&mesh, |_, _| {}, &CancelToken::new());
//! let job = result?;
//! job.gcode.write_to_file("output.gcode")?;
//! ```

pub mod adhesion;
pub mod clipper;
pub mod config;
pub mod gcode;
pub mod geometry;
pub mod infill;
pub mod mesh;
pub mod perimeter;
pub mod pipeline;
pub mod slice;
pub mod support;

// Re-export commonly used types
pub use adhesion::{generate_brim, BrimResult};
pub use config::{
    InfillPattern, MaterialProfile, PrinterProfile, SeamPosition, SliceSettings, SupportPattern,
};
pub use gcode::{
    ExtrusionPath, ExtrusionRole, GCode, GCodeWriter, LayerPaths, PathGenerator, PrintEstimates,
};
pub use geometry::{
    BoundingBox, BoundingBox3F, ExPolygon, ExPolygons, Point, PointF, Polygon, Polyline,
};
pub use mesh::TriangleMesh;
pub use pipeline::{CancelToken, PipelineStage, SlicedJob, Slicer};
pub use slice::{slice_mesh, slice_mesh_at_z, LayerPlan, LayerRegions};
pub use support::SupportGenerator;

/// Coordinate type used throughout the slicer.
/// Using i64 for integer coordinates (scaled by SCALING_FACTOR) to avoid
/// floating-point issues in the boolean/offset heavy parts of the pipeline.
pub type Coord = i64;

/// Floating-point coordinate type for unscaled (millimeter) values.
pub type CoordF = f64;

/// Scaling factor: coordinates are stored as integers scaled by this factor.
/// 1 unit = 1 nanometer, so 1mm = 1_000_000 units.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Scale a floating-point millimeter coordinate to internal units.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Unscale an internal coordinate back to millimeters.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// Result type used throughout the slicer.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for slicer operations.
///
/// Any fatal error short-circuits the pipeline; partial G-code is never
/// produced. Recoverable conditions are reported as [`Warning`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("object exceeds the build volume: {0}")]
    OutOfVolume(String),

    #[error("invalid parameter `{field}`: {reason}")]
    ParameterInvalid { field: &'static str, reason: String },

    #[error("no printable layers")]
    EmptyJob,

    #[error("cancelled")]
    Cancelled,

    #[error("geometry operation failed: {0}")]
    InternalGeometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct a `ParameterInvalid` error for the given field.
    pub fn parameter(field: &'static str, reason: impl Into<String>) -> Self {
        Error::ParameterInvalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions collected during a slicing job and returned
/// alongside the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A layer had segments that could not be stitched into a closed ring;
    /// the open chains were discarded.
    OpenContourDiscarded { layer: usize },

    /// An inward wall offset produced empty geometry; the remaining walls
    /// were skipped for that layer.
    WallOffsetEmpty { layer: usize, wall: usize },

    /// A parameter was accepted but is not applied by the current pipeline.
    ParameterIgnored { name: &'static str },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::OpenContourDiscarded { layer } => {
                write!(f, "layer {}: open contour discarded", layer)
            }
            Warning::WallOffsetEmpty { layer, wall } => {
                write!(
                    f,
                    "layer {}: wall {} offset produced no geometry",
                    layer, wall
                )
            }
            Warning::ParameterIgnored { name } => {
                write!(f, "parameter `{}` is accepted but not applied", name)
            }
        }
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
