//! Job configuration.
//!
//! [`SliceSettings`] is the flat, validated parameter set one slicing job
//! runs with. Printer and material profiles live on disk at the host side
//! and are merged into the settings before the core is invoked.

mod profiles;
mod settings;

pub use profiles::{
    load_material_profiles, load_preset, load_printer_profiles, MaterialProfile, PrinterProfile,
};
pub use settings::{InfillPattern, SeamPosition, SliceSettings, SupportPattern};
