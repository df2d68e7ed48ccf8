//! G-code generation.
//!
//! Three pieces cooperate here:
//! - [`path`] turns per-layer regions and fill lines into ordered
//!   [`ExtrusionPath`]s with seam placement,
//! - [`writer`] is the low-level printer-state machine that formats
//!   individual commands while tracking position, extruder and retraction
//!   state,
//! - [`generator`] walks the ordered layers and drives the writer,
//!   producing the final [`GCode`] program.

mod generator;
mod path;
mod writer;

pub use generator::{GCode, GCodeEmitter, PrintEstimates};
pub use path::{ExtrusionPath, ExtrusionRole, LayerPaths, PathConfig, PathGenerator};
pub use writer::GCodeWriter;
