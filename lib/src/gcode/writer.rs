//! Low-level G-code writer.
//!
//! The writer owns the printer state (position, absolute extruder
//! coordinate, retraction flag, fan duty) and exposes one method per state
//! transition. All side effects on the emitted program go through here,
//! which keeps the retract/prime pairing and the monotonic-E invariant in
//! one place.

use crate::CoordF;
use std::fmt::Write as _;

/// Position epsilon under which two XY coordinates count as the same spot.
const POSITION_EPSILON: CoordF = 1e-4;

/// G-code writer and printer state.
#[derive(Debug, Clone, Default)]
pub struct GCodeWriter {
    buffer: String,
    x: CoordF,
    y: CoordF,
    z: CoordF,
    e: CoordF,
    retracted: bool,
    fan_duty: Option<u8>,
}

impl GCodeWriter {
    /// Create a writer at the origin with a cold printer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current XY position in millimeters.
    #[inline]
    pub fn position(&self) -> (CoordF, CoordF) {
        (self.x, self.y)
    }

    /// Current Z in millimeters.
    #[inline]
    pub fn z(&self) -> CoordF {
        self.z
    }

    /// Current absolute extruder coordinate in millimeters of filament.
    #[inline]
    pub fn e(&self) -> CoordF {
        self.e
    }

    /// Whether the filament is currently retracted.
    #[inline]
    pub fn is_retracted(&self) -> bool {
        self.retracted
    }

    /// Distance from the current position to a target, in millimeters.
    pub fn distance_to(&self, x: CoordF, y: CoordF) -> CoordF {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether the nozzle is already at the target position.
    pub fn is_at(&self, x: CoordF, y: CoordF) -> bool {
        self.distance_to(x, y) < POSITION_EPSILON
    }

    /// Emit a raw line verbatim.
    pub fn raw(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    /// Emit a `; comment` line.
    pub fn comment(&mut self, text: &str) {
        let _ = writeln!(self.buffer, "; {}", text);
    }

    /// Emit the layer prologue markers.
    pub fn begin_layer(&mut self, index: usize, z: CoordF) {
        let _ = writeln!(self.buffer, "; LAYER:{}", index);
        let _ = writeln!(self.buffer, "; Z:{:.3}", z);
    }

    /// Set bed temperature (`M140`/`M190`).
    pub fn set_bed_temperature(&mut self, celsius: u32, wait: bool) {
        let code = if wait { "M190" } else { "M140" };
        let _ = writeln!(self.buffer, "{} S{}", code, celsius);
    }

    /// Set nozzle temperature (`M104`/`M109`).
    pub fn set_nozzle_temperature(&mut self, celsius: u32, wait: bool) {
        let code = if wait { "M109" } else { "M104" };
        let _ = writeln!(self.buffer, "{} S{}", code, celsius);
    }

    /// Set the part cooling fan duty in percent (`M106`/`M107`).
    ///
    /// Re-setting the current duty emits nothing.
    pub fn set_fan_percent(&mut self, percent: u32) {
        let duty = ((percent.min(100) as CoordF) * 255.0 / 100.0).round() as u8;
        if self.fan_duty == Some(duty) {
            return;
        }
        self.fan_duty = Some(duty);
        if duty == 0 {
            self.raw("M107");
        } else {
            let _ = writeln!(self.buffer, "M106 S{}", duty);
        }
    }

    /// Rapid XY travel (`G0`).
    pub fn travel_to(&mut self, x: CoordF, y: CoordF, feed_mm_min: CoordF) {
        let _ = writeln!(self.buffer, "G0 X{:.3} Y{:.3} F{:.0}", x, y, feed_mm_min);
        self.x = x;
        self.y = y;
    }

    /// Rapid Z move (`G0`).
    pub fn travel_to_z(&mut self, z: CoordF, feed_mm_min: CoordF) {
        let _ = writeln!(self.buffer, "G0 Z{:.3} F{:.0}", z, feed_mm_min);
        self.z = z;
    }

    /// Extruding XY move (`G1`), advancing E by `e_delta`.
    pub fn extrude_to(&mut self, x: CoordF, y: CoordF, e_delta: CoordF, feed_mm_min: CoordF) {
        self.e += e_delta;
        let _ = writeln!(
            self.buffer,
            "G1 X{:.3} Y{:.3} E{:.5} F{:.0}",
            x, y, self.e, feed_mm_min
        );
        self.x = x;
        self.y = y;
    }

    /// Extruding XYZ move (`G1`) for the spiral region, where Z rises
    /// continuously along the wall.
    pub fn extrude_to_xyz(
        &mut self,
        x: CoordF,
        y: CoordF,
        z: CoordF,
        e_delta: CoordF,
        feed_mm_min: CoordF,
    ) {
        self.e += e_delta;
        let _ = writeln!(
            self.buffer,
            "G1 X{:.3} Y{:.3} Z{:.3} E{:.5} F{:.0}",
            x, y, z, self.e, feed_mm_min
        );
        self.x = x;
        self.y = y;
        self.z = z;
    }

    /// Pull back filament before a travel move.
    ///
    /// A second retract without an intervening [`prime`](Self::prime) is a
    /// no-op, which keeps E monotone outside genuine retractions.
    pub fn retract(&mut self, distance: CoordF, speed_mm_s: CoordF) {
        if self.retracted || distance <= 0.0 {
            return;
        }
        self.retracted = true;
        self.e -= distance;
        let _ = writeln!(self.buffer, "G1 E{:.5} F{:.0}", self.e, speed_mm_s * 60.0);
    }

    /// Push filament back after a retracted travel, plus any extra prime.
    pub fn prime(&mut self, distance: CoordF, extra: CoordF, speed_mm_s: CoordF) {
        if !self.retracted {
            return;
        }
        self.retracted = false;
        self.e += distance + extra;
        let _ = writeln!(self.buffer, "G1 E{:.5} F{:.0}", self.e, speed_mm_s * 60.0);
    }

    /// Finish the program and hand back the text.
    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_updates_position() {
        let mut writer = GCodeWriter::new();
        writer.travel_to(10.0, 20.0, 12000.0);
        assert_eq!(writer.position(), (10.0, 20.0));
        assert!(writer.finish().contains("G0 X10.000 Y20.000 F12000"));
    }

    #[test]
    fn test_extrude_accumulates_e() {
        let mut writer = GCodeWriter::new();
        writer.extrude_to(10.0, 0.0, 0.5, 3600.0);
        writer.extrude_to(20.0, 0.0, 0.5, 3600.0);
        assert!((writer.e() - 1.0).abs() < 1e-9);

        let text = writer.finish();
        assert!(text.contains("E0.50000"));
        assert!(text.contains("E1.00000"));
    }

    #[test]
    fn test_retract_prime_pairing() {
        let mut writer = GCodeWriter::new();
        writer.extrude_to(10.0, 0.0, 1.0, 3600.0);

        writer.retract(5.0, 45.0);
        assert!(writer.is_retracted());
        assert!((writer.e() - (-4.0)).abs() < 1e-9);

        // Double retract is ignored
        writer.retract(5.0, 45.0);
        assert!((writer.e() - (-4.0)).abs() < 1e-9);

        writer.prime(5.0, 0.5, 45.0);
        assert!(!writer.is_retracted());
        assert!((writer.e() - 1.5).abs() < 1e-9);

        // Prime without retract is ignored
        writer.prime(5.0, 0.0, 45.0);
        assert!((writer.e() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_fan_duty_conversion_and_dedup() {
        let mut writer = GCodeWriter::new();
        writer.set_fan_percent(100);
        writer.set_fan_percent(100); // deduplicated
        writer.set_fan_percent(0);

        let text = writer.finish();
        assert_eq!(text.matches("M106 S255").count(), 1);
        assert_eq!(text.matches("M107").count(), 1);
    }

    #[test]
    fn test_temperatures() {
        let mut writer = GCodeWriter::new();
        writer.set_bed_temperature(60, false);
        writer.set_bed_temperature(60, true);
        writer.set_nozzle_temperature(215, true);

        let text = writer.finish();
        assert!(text.contains("M140 S60"));
        assert!(text.contains("M190 S60"));
        assert!(text.contains("M109 S215"));
    }

    #[test]
    fn test_spiral_move_tracks_z() {
        let mut writer = GCodeWriter::new();
        writer.extrude_to_xyz(1.0, 2.0, 0.35, 0.01, 1800.0);
        assert!((writer.z() - 0.35).abs() < 1e-9);
        assert!(writer.finish().contains("Z0.350"));
    }

    #[test]
    fn test_is_at() {
        let mut writer = GCodeWriter::new();
        writer.travel_to(10.0, 10.0, 12000.0);
        assert!(writer.is_at(10.0, 10.0));
        assert!(!writer.is_at(10.1, 10.0));
    }
}
