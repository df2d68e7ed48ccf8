//! Printer and material profiles.
//!
//! Profiles live on disk at the host side (`printers.json`,
//! `materials.json` and `presets/*.json`) and are merged into
//! [`SliceSettings`] before the core is invoked; the pipeline itself never
//! reads files.

use super::SliceSettings;
use crate::{CoordF, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A machine profile as stored in `printers.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterProfile {
    pub name: String,
    /// Build volume (x, y, z) in millimeters.
    pub bed_size: [CoordF; 3],
    /// Maximum heated-bed temperature, 0 = no heated bed.
    pub bed_temp_max: u32,
    pub nozzle_diameter: CoordF,
    pub filament_diameter: CoordF,
    /// Firmware speed ceiling (mm/s).
    pub max_print_speed: CoordF,
    pub start_gcode: String,
    pub end_gcode: String,
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self {
            name: "Generic 220".to_string(),
            bed_size: [220.0, 220.0, 250.0],
            bed_temp_max: 100,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,
            max_print_speed: 200.0,
            start_gcode: "G28\nG92 E0".to_string(),
            end_gcode: "M104 S0\nM140 S0\nM84".to_string(),
        }
    }
}

/// A material profile as stored in `materials.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProfile {
    pub name: String,
    pub print_temp: u32,
    pub print_temp_first_layer: u32,
    pub bed_temp: u32,
    /// Part cooling fan duty in percent.
    pub fan_speed: u32,
    pub retraction_distance: CoordF,
}

impl Default for MaterialProfile {
    fn default() -> Self {
        Self {
            name: "PLA".to_string(),
            print_temp: 210,
            print_temp_first_layer: 215,
            bed_temp: 60,
            fan_speed: 100,
            retraction_distance: 5.0,
        }
    }
}

impl SliceSettings {
    /// Merge machine parameters from a printer profile.
    pub fn apply_printer(&mut self, printer: &PrinterProfile) {
        self.bed_size = printer.bed_size;
        self.nozzle_diameter = printer.nozzle_diameter;
        self.filament_diameter = printer.filament_diameter;
        self.start_gcode = printer.start_gcode.clone();
        self.end_gcode = printer.end_gcode.clone();
        self.travel_speed = self.travel_speed.min(printer.max_print_speed);
    }

    /// Merge material parameters from a material profile.
    pub fn apply_material(&mut self, material: &MaterialProfile) {
        self.print_temp = material.print_temp;
        self.print_temp_first_layer = material.print_temp_first_layer;
        self.bed_temp = material.bed_temp;
        self.fan_speed = material.fan_speed;
        self.retraction_distance = material.retraction_distance;
    }
}

/// Load `printers.json`.
pub fn load_printer_profiles(path: impl AsRef<Path>) -> Result<Vec<PrinterProfile>> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| crate::Error::parameter("printers.json", e.to_string()))
}

/// Load `materials.json`.
pub fn load_material_profiles(path: impl AsRef<Path>) -> Result<Vec<MaterialProfile>> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| crate::Error::parameter("materials.json", e.to_string()))
}

/// Load a preset file holding a full or partial [`SliceSettings`].
pub fn load_preset(path: impl AsRef<Path>) -> Result<SliceSettings> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| crate::Error::parameter("preset", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_printer() {
        let mut settings = SliceSettings::default();
        let printer = PrinterProfile {
            bed_size: [300.0, 300.0, 400.0],
            nozzle_diameter: 0.6,
            max_print_speed: 150.0,
            ..Default::default()
        };
        settings.apply_printer(&printer);
        assert_eq!(settings.bed_size, [300.0, 300.0, 400.0]);
        assert!((settings.nozzle_diameter - 0.6).abs() < 1e-9);
        // Travel speed is clamped to the machine ceiling
        assert!((settings.travel_speed - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_material() {
        let mut settings = SliceSettings::default();
        let material = MaterialProfile {
            print_temp: 245,
            print_temp_first_layer: 250,
            bed_temp: 85,
            fan_speed: 30,
            retraction_distance: 2.0,
            ..Default::default()
        };
        settings.apply_material(&material);
        assert_eq!(settings.print_temp, 245);
        assert_eq!(settings.bed_temp, 85);
        assert!((settings.retraction_distance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_profile_json_shape() {
        let json = r#"[{"name": "Test", "bed_size": [200.0, 200.0, 200.0]}]"#;
        let profiles: Vec<PrinterProfile> = serde_json::from_str(json).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Test");
        // Unspecified fields fall back to defaults
        assert!((profiles[0].nozzle_diameter - 0.4).abs() < 1e-9);
    }
}
