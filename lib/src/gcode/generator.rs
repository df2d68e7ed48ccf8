//! G-code program assembly.
//!
//! The emitter walks the ordered layers and drives the [`GCodeWriter`]:
//! startup header and temperatures, per-layer markers and fan control,
//! travel moves with retraction and z-hop, extrusion arithmetic, and the
//! continuous-Z spiral region for vase prints.
//!
//! Extrusion amounts follow the bead model: a segment of length `d` lays a
//! bead of `line_width * layer_height` cross-section, so the filament
//! advance is `d * line_width * layer_height / (pi * (filament_diameter/2)^2)`.
//! E is absolute and monotone except at retractions.

use super::path::{ExtrusionRole, LayerPaths};
use super::writer::GCodeWriter;
use crate::config::SliceSettings;
use crate::{CoordF, Error, Result};
use std::path::Path;

/// Segments shorter than this are merged into their neighbor (mm).
const MIN_SEGMENT_LENGTH: CoordF = 1e-4;

/// Fixed allowance for heating the machine in the time estimate (seconds).
const HEATUP_ALLOWANCE_S: CoordF = 300.0;

/// A finished G-code program.
#[derive(Debug, Clone)]
pub struct GCode {
    text: String,
    estimates: PrintEstimates,
}

impl GCode {
    /// The program text (UTF-8, LF line endings).
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Iterate over the program's lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Print time and material estimates.
    pub fn estimates(&self) -> &PrintEstimates {
        &self.estimates
    }

    /// Write the program to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.text.as_bytes()).map_err(Error::Io)
    }
}

/// Rough print time and filament usage, computed from path lengths.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintEstimates {
    /// Estimated print time in seconds, including a heat-up allowance.
    pub print_time_s: CoordF,
    /// Filament consumed, in millimeters of filament.
    pub filament_mm: CoordF,
    /// Filament consumed, in grams (PLA density).
    pub filament_g: CoordF,
}

/// Emits a G-code program from ordered layers.
#[derive(Debug)]
pub struct GCodeEmitter<'a> {
    settings: &'a SliceSettings,
}

impl<'a> GCodeEmitter<'a> {
    /// Create an emitter for the given job settings.
    pub fn new(settings: &'a SliceSettings) -> Self {
        Self { settings }
    }

    /// Emit the complete program for the ordered layers.
    pub fn emit(&self, layers: &[LayerPaths]) -> GCode {
        let mut writer = GCodeWriter::new();

        self.write_startup(&mut writer, layers.len());

        for layer in layers {
            self.write_layer(&mut writer, layer);
        }

        self.write_shutdown(&mut writer);

        let estimates = self.estimate(layers, writer.e());
        GCode {
            text: writer.finish(),
            estimates,
        }
    }

    fn write_startup(&self, writer: &mut GCodeWriter, layer_count: usize) {
        let s = self.settings;

        writer.comment("Generated by Kasynel_Slicer");
        writer.raw(&format!("; LAYER_COUNT:{}", layer_count));
        writer.raw(&format!("; LAYER_HEIGHT:{}", s.layer_height));

        for line in self.expand_template(&s.start_gcode).lines() {
            writer.raw(line);
        }

        // First-layer temperatures: start both heaters, then wait.
        writer.set_bed_temperature(s.bed_temp, false);
        writer.set_nozzle_temperature(s.print_temp_first_layer, false);
        writer.set_bed_temperature(s.bed_temp, true);
        writer.set_nozzle_temperature(s.print_temp_first_layer, true);

        writer.set_fan_percent(s.fan_first_layer);
    }

    fn write_layer(&self, writer: &mut GCodeWriter, layer: &LayerPaths) {
        let s = self.settings;

        writer.begin_layer(layer.layer_index, layer.z);

        if layer.layer_index as u32 == s.fan_kick_in_layer {
            writer.set_fan_percent(s.fan_speed);
        }
        if layer.layer_index == 1 {
            writer.set_nozzle_temperature(s.print_temp, false);
        }

        if !layer.has_paths() {
            return;
        }

        // In the spiral region Z rises along the wall instead of stepping
        // at the layer boundary.
        if !layer.spiral {
            writer.travel_to_z(layer.z, s.travel_speed * 60.0);
        }

        for path in &layer.paths {
            if path.points.len() < 2 {
                continue;
            }
            writer.raw(&format!("; TYPE:{}", path.role.type_tag()));
            self.travel_to_path_start(writer, layer, path.points[0].to_mm().x, path.points[0].to_mm().y);

            if layer.spiral && path.role.is_wall() && path.is_closed {
                self.extrude_spiral(writer, layer, path);
            } else {
                self.extrude_path(writer, layer, path);
            }
        }
    }

    /// Travel to a path start, retracting and z-hopping when warranted.
    fn travel_to_path_start(&self, writer: &mut GCodeWriter, layer: &LayerPaths, x: CoordF, y: CoordF) {
        let s = self.settings;
        if writer.is_at(x, y) {
            return;
        }

        let travel_feed = s.travel_speed * 60.0;
        let distance = writer.distance_to(x, y);
        let retract = s.retraction_enabled
            && !layer.spiral
            && distance >= s.retraction_min_distance;

        let mut hopped = false;
        if retract {
            writer.retract(s.retraction_distance, s.retraction_speed);
            if s.retraction_z_hop > 0.0 {
                writer.travel_to_z(layer.z + s.retraction_z_hop, travel_feed);
                hopped = true;
            }
        }

        writer.travel_to(x, y, travel_feed);

        if hopped {
            writer.travel_to_z(layer.z, travel_feed);
        }
        if writer.is_retracted() {
            writer.prime(
                s.retraction_distance,
                s.retraction_extra_prime,
                s.retraction_speed,
            );
        }
    }

    /// Extrude a path at constant Z.
    fn extrude_path(&self, writer: &mut GCodeWriter, layer: &LayerPaths, path: &super::ExtrusionPath) {
        let e_per_mm = self.e_per_mm(layer.height);
        let feed = self.feedrate(path.role, layer.layer_index) * 60.0;

        let mut prev = path.points[0].to_mm();
        let mut pending = 0.0;
        for &point in path.points[1..]
            .iter()
            .chain(path.is_closed.then_some(&path.points[0]))
        {
            let target = point.to_mm();
            let d = prev.distance(target) + pending;
            if d < MIN_SEGMENT_LENGTH {
                pending = d;
                prev = target;
                continue;
            }
            pending = 0.0;
            writer.extrude_to(target.x, target.y, d * e_per_mm, feed);
            prev = target;
        }
    }

    /// Extrude a spiral wall, interpolating Z over the loop's length.
    fn extrude_spiral(&self, writer: &mut GCodeWriter, layer: &LayerPaths, path: &super::ExtrusionPath) {
        let e_per_mm = self.e_per_mm(layer.height);
        let feed = self.feedrate(path.role, layer.layer_index) * 60.0;

        let total = path.length_mm();
        if total <= 0.0 {
            return;
        }
        let z_base = layer.z - layer.height;

        let mut prev = path.points[0].to_mm();
        let mut travelled = 0.0;
        for &point in path.points[1..].iter().chain(std::iter::once(&path.points[0])) {
            let target = point.to_mm();
            let d = prev.distance(target);
            if d < MIN_SEGMENT_LENGTH {
                continue;
            }
            travelled += d;
            let z = z_base + (travelled / total) * layer.height;
            writer.extrude_to_xyz(target.x, target.y, z, d * e_per_mm, feed);
            prev = target;
        }
    }

    fn write_shutdown(&self, writer: &mut GCodeWriter) {
        for line in self.expand_template(&self.settings.end_gcode).lines() {
            writer.raw(line);
        }
        writer.raw("M107");
    }

    /// Filament advance per millimeter of XY travel for the given layer
    /// thickness.
    fn e_per_mm(&self, layer_height: CoordF) -> CoordF {
        let s = self.settings;
        let filament_radius = s.filament_diameter / 2.0;
        let filament_area = std::f64::consts::PI * filament_radius * filament_radius;
        s.line_width() * layer_height / filament_area
    }

    /// Feedrate in mm/s for a role on a layer. The whole first layer,
    /// and the brim on any layer, use the first-layer speed.
    fn feedrate(&self, role: ExtrusionRole, layer_index: usize) -> CoordF {
        let s = self.settings;
        if layer_index == 0 || role == ExtrusionRole::Brim {
            return s.first_layer_speed;
        }
        match role {
            ExtrusionRole::WallOuter => s.outer_perimeter_speed,
            ExtrusionRole::WallInner => s.print_speed,
            ExtrusionRole::Skin => s.top_bottom_speed,
            ExtrusionRole::Fill => s.infill_speed,
            ExtrusionRole::Support => s.infill_speed,
            ExtrusionRole::Brim => s.first_layer_speed,
        }
    }

    /// Substitute `{print_temp}`, `{bed_temp}` and `{nozzle_diameter}` in a
    /// start/end template.
    fn expand_template(&self, template: &str) -> String {
        let s = self.settings;
        template
            .replace("{print_temp}", &s.print_temp.to_string())
            .replace("{bed_temp}", &s.bed_temp.to_string())
            .replace("{nozzle_diameter}", &s.nozzle_diameter.to_string())
    }

    fn estimate(&self, layers: &[LayerPaths], final_e: CoordF) -> PrintEstimates {
        let s = self.settings;

        let mut time = HEATUP_ALLOWANCE_S;
        for layer in layers {
            for path in &layer.paths {
                let feed = self.feedrate(path.role, layer.layer_index);
                time += path.length_mm() / feed;
            }
        }

        let filament_mm = final_e.max(0.0);
        let filament_radius = s.filament_diameter / 2.0;
        let volume_mm3 = filament_mm * std::f64::consts::PI * filament_radius * filament_radius;
        // PLA: 1.24 g/cm^3
        let filament_g = volume_mm3 * 1.24e-3;

        PrintEstimates {
            print_time_s: time,
            filament_mm,
            filament_g,
        }
    }
}
