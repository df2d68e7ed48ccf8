//! Extrusion paths and per-layer print ordering.
//!
//! The path generator flattens a layer's regions into the print order the
//! emitter consumes:
//!
//! 1. Brim rings (first layer only), outermost ring inward
//! 2. Per outline component: walls, outer-first or inner-first
//! 3. Skin, then sparse infill
//! 4. Support
//!
//! Within a kind, paths are greedily chained nearest-neighbor from the
//! last position, reversing open paths when their far end is closer.
//! Closed wall loops get their seam placed before ordering.

use crate::config::SeamPosition;
use crate::geometry::{Point, Polygon, Polyline};
use crate::slice::LayerRegions;
use crate::CoordF;

/// What a path lays down; selects speed and the `; TYPE:` comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrusionRole {
    /// Outermost wall loop.
    WallOuter,
    /// Inner wall loops.
    WallInner,
    /// Solid top/bottom fill.
    Skin,
    /// Sparse interior fill.
    Fill,
    /// Support material.
    Support,
    /// Brim ring.
    Brim,
}

impl ExtrusionRole {
    /// The exact `; TYPE:` tag emitted for this role.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ExtrusionRole::WallOuter => "WALL-OUTER",
            ExtrusionRole::WallInner => "WALL-INNER",
            ExtrusionRole::Skin => "SKIN",
            ExtrusionRole::Fill => "FILL",
            ExtrusionRole::Support => "SUPPORT",
            ExtrusionRole::Brim => "BRIM",
        }
    }

    /// Whether this role is a wall loop.
    pub fn is_wall(&self) -> bool {
        matches!(self, ExtrusionRole::WallOuter | ExtrusionRole::WallInner)
    }
}

/// A single printable path: an ordered polyline with its role.
///
/// Paths carry no extrusion amounts; the emitter computes those from
/// segment lengths and the job's bead geometry.
#[derive(Debug, Clone)]
pub struct ExtrusionPath {
    /// Path vertices in scaled coordinates.
    pub points: Vec<Point>,
    /// Closed loop (the closing edge back to the first vertex is printed).
    pub is_closed: bool,
    /// What the path lays down.
    pub role: ExtrusionRole,
}

impl ExtrusionPath {
    /// Create a closed path from a polygon.
    pub fn from_polygon(polygon: &Polygon, role: ExtrusionRole) -> Self {
        Self {
            points: polygon.points().to_vec(),
            is_closed: true,
            role,
        }
    }

    /// Create an open path from a polyline.
    pub fn from_polyline(polyline: &Polyline, role: ExtrusionRole) -> Self {
        Self {
            points: polyline.points().to_vec(),
            is_closed: false,
            role,
        }
    }

    /// First vertex, if any.
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// The position the nozzle ends at after printing this path.
    pub fn end_point(&self) -> Option<Point> {
        if self.is_closed {
            self.first_point()
        } else {
            self.points.last().copied()
        }
    }

    /// Printed length in millimeters, including the closing edge of loops.
    pub fn length_mm(&self) -> CoordF {
        let open: CoordF = self
            .points
            .windows(2)
            .map(|w| w[0].distance_mm(w[1]))
            .sum();
        if self.is_closed && self.points.len() > 2 {
            open + self.points[self.points.len() - 1].distance_mm(self.points[0])
        } else {
            open
        }
    }

    /// Reverse an open path in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Rotate a closed loop so the given vertex becomes the seam
    /// (start and end point).
    pub fn place_seam_at(&mut self, index: usize) {
        if self.is_closed && index > 0 && index < self.points.len() {
            self.points.rotate_left(index);
        }
    }
}

/// All paths of one layer, in print order.
#[derive(Debug, Clone, Default)]
pub struct LayerPaths {
    /// Layer index, 0 = first printed layer.
    pub layer_index: usize,
    /// Top of the layer in millimeters.
    pub z: CoordF,
    /// Layer thickness in millimeters.
    pub height: CoordF,
    /// Paths in print order.
    pub paths: Vec<ExtrusionPath>,
    /// This layer is part of the continuous-Z spiral region.
    pub spiral: bool,
}

impl LayerPaths {
    /// Create an empty layer.
    pub fn new(layer_index: usize, z: CoordF, height: CoordF) -> Self {
        Self {
            layer_index,
            z,
            height,
            ..Default::default()
        }
    }

    /// Whether the layer prints anything.
    pub fn has_paths(&self) -> bool {
        !self.paths.is_empty()
    }

    /// Total printed length in millimeters.
    pub fn total_length_mm(&self) -> CoordF {
        self.paths.iter().map(|p| p.length_mm()).sum()
    }
}

/// Ordering configuration, taken from the job settings.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Print the outer wall before the inner walls.
    pub outer_before_inner: bool,
    /// Seam policy for closed wall loops. `Random` and `Sharpest` behave
    /// as `Back`; the pipeline records the fallback.
    pub seam_position: SeamPosition,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            outer_before_inner: false,
            seam_position: SeamPosition::Back,
        }
    }
}

/// Orders the paths of successive layers, tracking the nozzle position
/// across layers so each layer starts near where the previous one ended.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    config: PathConfig,
    current_pos: Point,
}

impl PathGenerator {
    /// Create a generator starting from the bed origin.
    pub fn new(config: PathConfig) -> Self {
        Self {
            config,
            current_pos: Point::new(0, 0),
        }
    }

    /// Build the ordered path list for one layer.
    ///
    /// `skin`, `fill` and `support` are the synthesized fill lines for the
    /// layer's regions; walls and brim rings come from `regions` itself.
    pub fn generate_layer(
        &mut self,
        layer_index: usize,
        z: CoordF,
        height: CoordF,
        outline_components: &[Polygon],
        regions: &LayerRegions,
        skin: &[Polyline],
        fill: &[Polyline],
        support: &[Polyline],
        spiral: bool,
    ) -> LayerPaths {
        let mut layer = LayerPaths::new(layer_index, z, height);
        layer.spiral = spiral;

        // 1. Brim, already stored outermost-first.
        for ring in &regions.brim {
            let mut path = ExtrusionPath::from_polygon(ring, ExtrusionRole::Brim);
            self.seam_nearest(&mut path);
            self.push(&mut layer, path);
        }

        // 2. Walls, grouped per disjoint outline component.
        let mut component_walls = self.group_walls_by_component(outline_components, regions);
        // Visit components nearest-first.
        while !component_walls.is_empty() {
            let next = self.nearest_component(&component_walls);
            let walls = component_walls.swap_remove(next);
            for mut path in walls {
                self.place_seam(&mut path);
                self.push(&mut layer, path);
            }
        }

        // 3. Skin, then sparse infill.
        self.push_lines(&mut layer, skin, ExtrusionRole::Skin);
        self.push_lines(&mut layer, fill, ExtrusionRole::Fill);

        // 4. Support.
        self.push_lines(&mut layer, support, ExtrusionRole::Support);

        layer
    }

    fn push(&mut self, layer: &mut LayerPaths, path: ExtrusionPath) {
        if let Some(end) = path.end_point() {
            self.current_pos = end;
        }
        layer.paths.push(path);
    }

    /// Greedy nearest-neighbor ordering of open fill lines, reversing a
    /// line when its far end is the closer one.
    fn push_lines(&mut self, layer: &mut LayerPaths, lines: &[Polyline], role: ExtrusionRole) {
        let mut remaining: Vec<ExtrusionPath> = lines
            .iter()
            .filter(|pl| pl.len() >= 2)
            .map(|pl| ExtrusionPath::from_polyline(pl, role))
            .collect();

        while !remaining.is_empty() {
            let mut best = 0;
            let mut best_dist = i128::MAX;
            let mut best_reversed = false;
            for (i, path) in remaining.iter().enumerate() {
                let head = path.points[0].distance_sq(self.current_pos);
                if head < best_dist {
                    best = i;
                    best_dist = head;
                    best_reversed = false;
                }
                let tail = path.points[path.points.len() - 1].distance_sq(self.current_pos);
                if tail < best_dist {
                    best = i;
                    best_dist = tail;
                    best_reversed = true;
                }
            }
            let mut path = remaining.swap_remove(best);
            if best_reversed {
                path.reverse();
            }
            self.push(layer, path);
        }
    }

    /// Collect the wall loops belonging to each outline component, in the
    /// configured outer/inner order.
    fn group_walls_by_component(
        &self,
        outline_components: &[Polygon],
        regions: &LayerRegions,
    ) -> Vec<Vec<ExtrusionPath>> {
        let mut groups: Vec<Vec<ExtrusionPath>> = vec![Vec::new(); outline_components.len().max(1)];

        let wall_order: Vec<usize> = if self.config.outer_before_inner {
            (0..regions.walls.len()).collect()
        } else {
            (0..regions.walls.len()).rev().collect()
        };

        for &k in &wall_order {
            let role = if k == 0 {
                ExtrusionRole::WallOuter
            } else {
                ExtrusionRole::WallInner
            };
            for expoly in &regions.walls[k] {
                for ring in expoly.rings() {
                    if ring.len() < 3 {
                        continue;
                    }
                    let component = ring
                        .points()
                        .first()
                        .map(|&p| {
                            outline_components
                                .iter()
                                .position(|c| c.contains_point(p))
                                .unwrap_or(0)
                        })
                        .unwrap_or(0);
                    let idx = component.min(groups.len() - 1);
                    groups[idx].push(ExtrusionPath::from_polygon(ring, role));
                }
            }
        }

        groups.retain(|g| !g.is_empty());
        groups
    }

    /// Index of the component group whose first path starts nearest the
    /// current position.
    fn nearest_component(&self, groups: &[Vec<ExtrusionPath>]) -> usize {
        let mut best = 0;
        let mut best_dist = i128::MAX;
        for (i, group) in groups.iter().enumerate() {
            if let Some(start) = group.first().and_then(|p| p.first_point()) {
                let d = start.distance_sq(self.current_pos);
                if d < best_dist {
                    best = i;
                    best_dist = d;
                }
            }
        }
        best
    }

    /// Apply the configured seam policy to a closed wall loop.
    fn place_seam(&self, path: &mut ExtrusionPath) {
        if !path.is_closed || path.points.len() < 3 {
            return;
        }
        // `back`: the vertex with the largest Y. `random` and `sharpest`
        // reduce to the same choice in this pipeline.
        let seam = match self.config.seam_position {
            SeamPosition::Back | SeamPosition::Random | SeamPosition::Sharpest => path
                .points
                .iter()
                .enumerate()
                .max_by_key(|(_, p)| p.y)
                .map(|(i, _)| i)
                .unwrap_or(0),
        };
        path.place_seam_at(seam);
    }

    /// Start a loop at the vertex nearest the current position (used for
    /// brim rings, where the seam is cosmetically irrelevant).
    fn seam_nearest(&self, path: &mut ExtrusionPath) {
        if !path.is_closed || path.points.len() < 3 {
            return;
        }
        let nearest = path
            .points
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.distance_sq(self.current_pos))
            .map(|(i, _)| i)
            .unwrap_or(0);
        path.place_seam_at(nearest);
    }
}
