//! Slicing job parameters.

use crate::{CoordF, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sparse infill pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfillPattern {
    /// Crossing lines at 90 degrees.
    #[default]
    Grid,
    /// Single-direction parallel lines, alternating per layer.
    Lines,
    /// Hexagonal cells, perimeters only.
    Honeycomb,
}

impl fmt::Display for InfillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfillPattern::Grid => write!(f, "grid"),
            InfillPattern::Lines => write!(f, "lines"),
            InfillPattern::Honeycomb => write!(f, "honeycomb"),
        }
    }
}

impl std::str::FromStr for InfillPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grid" => Ok(InfillPattern::Grid),
            "lines" => Ok(InfillPattern::Lines),
            "honeycomb" => Ok(InfillPattern::Honeycomb),
            other => Err(Error::parameter(
                "infill_pattern",
                format!("unknown pattern `{}`", other),
            )),
        }
    }
}

/// Support fill pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportPattern {
    /// Single-direction parallel lines.
    #[default]
    Lines,
    /// Crossing lines.
    Grid,
    /// Connected back-and-forth lines (easier to remove in one piece).
    Zigzag,
}

impl fmt::Display for SupportPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportPattern::Lines => write!(f, "lines"),
            SupportPattern::Grid => write!(f, "grid"),
            SupportPattern::Zigzag => write!(f, "zigzag"),
        }
    }
}

impl std::str::FromStr for SupportPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lines" => Ok(SupportPattern::Lines),
            "grid" => Ok(SupportPattern::Grid),
            "zigzag" => Ok(SupportPattern::Zigzag),
            other => Err(Error::parameter(
                "support_pattern",
                format!("unknown pattern `{}`", other),
            )),
        }
    }
}

/// Seam placement policy for closed wall loops.
///
/// `Random` and `Sharpest` are accepted inputs but currently behave as
/// `Back`; the pipeline records a warning when they are requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeamPosition {
    /// Rear of the print (+Y).
    #[default]
    Back,
    /// Random vertex per loop.
    Random,
    /// Sharpest corner of the loop.
    Sharpest,
}

impl fmt::Display for SeamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeamPosition::Back => write!(f, "back"),
            SeamPosition::Random => write!(f, "random"),
            SeamPosition::Sharpest => write!(f, "sharpest"),
        }
    }
}

/// The flat parameter set for one slicing job.
///
/// Printer and material profile values are merged in before the job starts;
/// the struct is immutable for the duration of a job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceSettings {
    // === Layers / extrusion ===
    /// Layer height (mm).
    pub layer_height: CoordF,
    /// First layer height (mm).
    pub first_layer_height: CoordF,
    /// Line width as a percentage of the nozzle diameter.
    pub line_width_pct: CoordF,
    /// Nozzle diameter (mm).
    pub nozzle_diameter: CoordF,
    /// Filament diameter (mm).
    pub filament_diameter: CoordF,

    // === Walls ===
    /// Number of wall loops.
    pub wall_count: u32,
    /// Print the outer wall before the inner walls.
    pub outer_before_inner: bool,
    /// Seam placement policy.
    pub seam_position: SeamPosition,

    // === Infill ===
    /// Sparse infill density in percent (0-100).
    pub infill_density: CoordF,
    /// Sparse infill pattern.
    pub infill_pattern: InfillPattern,
    /// Base infill angle in degrees. Accepted but not applied.
    pub infill_angle: CoordF,
    /// Sparse infill overlap into the innermost wall, percent of line width.
    pub infill_overlap: CoordF,

    // === Top / bottom ===
    /// Number of solid top layers.
    pub top_layers: u32,
    /// Number of solid bottom layers.
    pub bottom_layers: u32,
    /// Skin overlap into the innermost wall, percent of line width.
    pub skin_overlap: CoordF,

    // === Brim ===
    /// Print a brim around the first layer.
    pub brim_enabled: bool,
    /// Brim width (mm).
    pub brim_width: CoordF,

    // === Retraction ===
    pub retraction_enabled: bool,
    /// Retraction distance (mm of filament).
    pub retraction_distance: CoordF,
    /// Retraction speed (mm/s).
    pub retraction_speed: CoordF,
    /// Z lift during retracted travels (mm, 0 = off).
    pub retraction_z_hop: CoordF,
    /// Travels shorter than this skip retraction (mm).
    pub retraction_min_distance: CoordF,
    /// Extra filament pushed after a retraction (mm).
    pub retraction_extra_prime: CoordF,

    // === Speeds (mm/s) ===
    /// Inner walls and general printing.
    pub print_speed: CoordF,
    /// Outer wall.
    pub outer_perimeter_speed: CoordF,
    /// Top/bottom solid skin.
    pub top_bottom_speed: CoordF,
    /// Sparse infill and support.
    pub infill_speed: CoordF,
    /// Bridging. Defined but never selected (no bridge detector).
    pub bridge_speed: CoordF,
    /// Everything on layer 0.
    pub first_layer_speed: CoordF,
    /// Travel moves.
    pub travel_speed: CoordF,
    /// Minimum seconds per layer. Accepted but not applied.
    pub min_layer_time: CoordF,

    // === Temperatures ===
    /// Nozzle temperature (deg C).
    pub print_temp: u32,
    /// Nozzle temperature on layer 0 (deg C).
    pub print_temp_first_layer: u32,
    /// Bed temperature (deg C).
    pub bed_temp: u32,

    // === Cooling ===
    /// Part cooling fan duty in percent once at full speed.
    pub fan_speed: u32,
    /// Fan duty on layer 0, percent.
    pub fan_first_layer: u32,
    /// Layer index at which the fan switches to `fan_speed`.
    pub fan_kick_in_layer: u32,

    // === Spiral (vase) mode ===
    /// Print a single continuous wall with continuously rising Z above the
    /// solid bottom layers.
    pub spiralize: bool,

    // === Support ===
    pub support_enabled: bool,
    /// Overhang threshold angle in degrees.
    pub support_threshold: CoordF,
    /// Support fill density in percent.
    pub support_density: CoordF,
    /// Support fill pattern.
    pub support_pattern: SupportPattern,
    /// Vertical gap between support and model (mm). Accepted, not applied.
    pub support_z_distance: CoordF,
    /// Horizontal gap between support and model (mm). Accepted, not applied.
    pub support_xy_distance: CoordF,
    /// Generate dense interface layers. Accepted, not applied.
    pub support_interface_enabled: bool,
    /// Number of interface layers. Accepted, not applied.
    pub support_interface_layers: u32,

    // === Machine (from the printer profile) ===
    /// Build volume (x, y, z) in millimeters.
    pub bed_size: [CoordF; 3],
    /// Startup G-code template. `{print_temp}`, `{bed_temp}` and
    /// `{nozzle_diameter}` are substituted.
    pub start_gcode: String,
    /// Shutdown G-code template, same substitutions.
    pub end_gcode: String,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            first_layer_height: 0.3,
            line_width_pct: 100.0,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,

            wall_count: 3,
            outer_before_inner: false,
            seam_position: SeamPosition::Back,

            infill_density: 20.0,
            infill_pattern: InfillPattern::Grid,
            infill_angle: 45.0,
            infill_overlap: 10.0,

            top_layers: 4,
            bottom_layers: 4,
            skin_overlap: 5.0,

            brim_enabled: false,
            brim_width: 8.0,

            retraction_enabled: true,
            retraction_distance: 5.0,
            retraction_speed: 45.0,
            retraction_z_hop: 0.0,
            retraction_min_distance: 1.5,
            retraction_extra_prime: 0.0,

            print_speed: 60.0,
            outer_perimeter_speed: 40.0,
            top_bottom_speed: 40.0,
            infill_speed: 80.0,
            bridge_speed: 25.0,
            first_layer_speed: 25.0,
            travel_speed: 200.0,
            min_layer_time: 5.0,

            print_temp: 210,
            print_temp_first_layer: 215,
            bed_temp: 60,

            fan_speed: 100,
            fan_first_layer: 0,
            fan_kick_in_layer: 2,

            spiralize: false,

            support_enabled: false,
            support_threshold: 45.0,
            support_density: 15.0,
            support_pattern: SupportPattern::Lines,
            support_z_distance: 0.2,
            support_xy_distance: 0.7,
            support_interface_enabled: true,
            support_interface_layers: 2,

            bed_size: [220.0, 220.0, 250.0],
            start_gcode: "G28\nG92 E0".to_string(),
            end_gcode: "M104 S0\nM140 S0\nM84".to_string(),
        }
    }
}

impl SliceSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute extrusion line width in millimeters
    /// (`nozzle_diameter * line_width_pct / 100`).
    #[inline]
    pub fn line_width(&self) -> CoordF {
        self.nozzle_diameter * self.line_width_pct / 100.0
    }

    /// Builder method: set layer height.
    pub fn layer_height(mut self, height: CoordF) -> Self {
        self.layer_height = height;
        self
    }

    /// Builder method: set first layer height.
    pub fn first_layer_height(mut self, height: CoordF) -> Self {
        self.first_layer_height = height;
        self
    }

    /// Builder method: set wall count.
    pub fn walls(mut self, count: u32) -> Self {
        self.wall_count = count;
        self
    }

    /// Builder method: set infill density (percent).
    pub fn infill_density(mut self, density: CoordF) -> Self {
        self.infill_density = density;
        self
    }

    /// Builder method: set infill pattern.
    pub fn infill_pattern(mut self, pattern: InfillPattern) -> Self {
        self.infill_pattern = pattern;
        self
    }

    /// Builder method: enable/disable supports.
    pub fn support(mut self, enabled: bool) -> Self {
        self.support_enabled = enabled;
        self
    }

    /// Builder method: enable the brim with the given width.
    pub fn brim(mut self, width: CoordF) -> Self {
        self.brim_enabled = width > 0.0;
        self.brim_width = width;
        self
    }

    /// Builder method: enable spiral (vase) mode.
    pub fn spiralize(mut self, enabled: bool) -> Self {
        self.spiralize = enabled;
        self
    }

    /// Validate all numeric parameters against their documented ranges.
    pub fn validate(&self) -> Result<()> {
        fn positive(field: &'static str, v: CoordF) -> Result<()> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::parameter(field, format!("must be positive, got {}", v)))
            }
        }
        fn non_negative(field: &'static str, v: CoordF) -> Result<()> {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(Error::parameter(
                    field,
                    format!("must be non-negative, got {}", v),
                ))
            }
        }
        fn in_range(field: &'static str, v: CoordF, lo: CoordF, hi: CoordF) -> Result<()> {
            if (lo..=hi).contains(&v) {
                Ok(())
            } else {
                Err(Error::parameter(
                    field,
                    format!("must be within {}..={}, got {}", lo, hi, v),
                ))
            }
        }

        positive("layer_height", self.layer_height)?;
        positive("first_layer_height", self.first_layer_height)?;
        positive("nozzle_diameter", self.nozzle_diameter)?;
        positive("filament_diameter", self.filament_diameter)?;
        in_range("line_width_pct", self.line_width_pct, 50.0, 250.0)?;
        if self.layer_height > self.nozzle_diameter {
            return Err(Error::parameter(
                "layer_height",
                format!(
                    "{} exceeds the nozzle diameter {}",
                    self.layer_height, self.nozzle_diameter
                ),
            ));
        }

        if self.wall_count == 0 {
            return Err(Error::parameter("wall_count", "at least one wall is required"));
        }

        in_range("infill_density", self.infill_density, 0.0, 100.0)?;
        in_range("infill_overlap", self.infill_overlap, 0.0, 100.0)?;
        in_range("skin_overlap", self.skin_overlap, 0.0, 100.0)?;
        non_negative("brim_width", self.brim_width)?;

        non_negative("retraction_distance", self.retraction_distance)?;
        positive("retraction_speed", self.retraction_speed)?;
        non_negative("retraction_z_hop", self.retraction_z_hop)?;
        non_negative("retraction_min_distance", self.retraction_min_distance)?;
        non_negative("retraction_extra_prime", self.retraction_extra_prime)?;

        positive("print_speed", self.print_speed)?;
        positive("outer_perimeter_speed", self.outer_perimeter_speed)?;
        positive("top_bottom_speed", self.top_bottom_speed)?;
        positive("infill_speed", self.infill_speed)?;
        positive("bridge_speed", self.bridge_speed)?;
        positive("first_layer_speed", self.first_layer_speed)?;
        positive("travel_speed", self.travel_speed)?;
        non_negative("min_layer_time", self.min_layer_time)?;

        in_range("support_threshold", self.support_threshold, 1.0, 89.0)?;
        in_range("support_density", self.support_density, 0.0, 100.0)?;
        non_negative("support_z_distance", self.support_z_distance)?;
        non_negative("support_xy_distance", self.support_xy_distance)?;

        in_range("fan_speed", self.fan_speed as CoordF, 0.0, 100.0)?;
        in_range("fan_first_layer", self.fan_first_layer as CoordF, 0.0, 100.0)?;

        for (i, &axis) in self.bed_size.iter().enumerate() {
            if axis <= 0.0 || !axis.is_finite() {
                return Err(Error::parameter(
                    "bed_size",
                    format!("axis {} must be positive, got {}", i, axis),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for SliceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SliceSettings(layer={:.2}mm, walls={}, infill={:.0}% {}, nozzle={:.2}mm)",
            self.layer_height,
            self.wall_count,
            self.infill_density,
            self.infill_pattern,
            self.nozzle_diameter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SliceSettings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.line_width() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_builder() {
        let settings = SliceSettings::new()
            .layer_height(0.15)
            .first_layer_height(0.2)
            .walls(2)
            .infill_density(35.0)
            .infill_pattern(InfillPattern::Honeycomb)
            .brim(6.0)
            .support(true)
            .spiralize(false);

        assert!((settings.layer_height - 0.15).abs() < 1e-9);
        assert!((settings.first_layer_height - 0.2).abs() < 1e-9);
        assert_eq!(settings.wall_count, 2);
        assert!(settings.brim_enabled);
        assert!(settings.support_enabled);
        assert!(!settings.spiralize);
        assert_eq!(settings.infill_pattern, InfillPattern::Honeycomb);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = SliceSettings::default();
        settings.layer_height = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(Error::ParameterInvalid { field: "layer_height", .. })
        ));

        let mut settings = SliceSettings::default();
        settings.infill_density = 120.0;
        assert!(settings.validate().is_err());

        let mut settings = SliceSettings::default();
        settings.wall_count = 0;
        assert!(settings.validate().is_err());

        let mut settings = SliceSettings::default();
        settings.layer_height = 0.5; // thicker than the 0.4 nozzle
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_line_width_derivation() {
        let mut settings = SliceSettings::default();
        settings.line_width_pct = 120.0;
        settings.nozzle_diameter = 0.6;
        assert!((settings.line_width() - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_parsing() {
        assert_eq!("grid".parse::<InfillPattern>().unwrap(), InfillPattern::Grid);
        assert_eq!(
            "zigzag".parse::<SupportPattern>().unwrap(),
            SupportPattern::Zigzag
        );
        assert!("spiral".parse::<InfillPattern>().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let settings = SliceSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: SliceSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.wall_count, settings.wall_count);
        assert_eq!(back.infill_pattern, settings.infill_pattern);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let back: SliceSettings = serde_json::from_str(r#"{"wall_count": 5}"#).unwrap();
        assert_eq!(back.wall_count, 5);
        assert!((back.layer_height - 0.2).abs() < 1e-9);
    }
}
