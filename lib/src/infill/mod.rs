//! Infill pattern generation.
//!
//! Fills a region with printable line paths. The same engine serves solid
//! skin (dense parallel lines), sparse infill (lines, grid, honeycomb) and
//! support fill (lines, grid, zigzag):
//!
//! 1. Generate the pattern's raw lines covering the region's bounding box
//! 2. Clip every line to the region by walking its boundary crossings
//! 3. Order the clipped pieces scanline by scanline, alternating direction
//!    (boustrophedon), so the print head sweeps back and forth
//!
//! Density converts to spacing as `line_width / (density / 100)`; the grid
//! pattern doubles the spacing per direction so the total amount of
//! material matches the requested density.

use crate::clipper::{grow, OffsetJoinType};
use crate::geometry::{
    region_contains_point, BoundingBox, ExPolygons, Point, Polygon, Polyline,
};
use crate::{scale, Coord, CoordF};
use std::collections::HashSet;

/// The fill pattern the engine lays down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillPattern {
    /// Parallel lines in one direction.
    Lines,
    /// Two crossed sets of parallel lines.
    Grid,
    /// Hexagonal cell walls.
    Honeycomb,
    /// Parallel lines connected into a continuous back-and-forth path.
    Zigzag,
}

/// Configuration for filling one region.
#[derive(Clone, Debug)]
pub struct InfillConfig {
    /// Pattern to generate.
    pub pattern: FillPattern,
    /// Center-to-center line spacing (mm).
    pub spacing: CoordF,
    /// How far the fill may reach outward past the region boundary into
    /// the surrounding wall, in millimeters.
    pub overlap: CoordF,
}

impl InfillConfig {
    /// Spacing for a density given in percent of solid.
    pub fn spacing_for_density(line_width: CoordF, density_pct: CoordF) -> CoordF {
        let density = density_pct.clamp(1.0, 100.0) / 100.0;
        line_width / density
    }
}

/// Fill a region with the configured pattern.
///
/// `layer_index` drives the per-layer direction alternation: even layers
/// run at 0 degrees, odd layers at 90.
pub fn fill_region(region: &ExPolygons, config: &InfillConfig, layer_index: usize) -> Vec<Polyline> {
    if region.is_empty() || config.spacing <= 0.0 {
        return Vec::new();
    }

    // The overlap expansion lets fill lines bite into the innermost wall.
    let clip_region = if config.overlap > 0.0 {
        grow(region, config.overlap, OffsetJoinType::Miter)
    } else {
        region.to_vec()
    };

    let angle = if layer_index % 2 == 0 { 0.0 } else { 90.0 };

    match config.pattern {
        FillPattern::Lines => parallel_fill(&clip_region, angle, config.spacing),
        FillPattern::Grid => {
            let mut paths = parallel_fill(&clip_region, angle, config.spacing * 2.0);
            paths.extend(parallel_fill(&clip_region, angle + 90.0, config.spacing * 2.0));
            paths
        }
        FillPattern::Honeycomb => honeycomb_fill(&clip_region, config.spacing),
        FillPattern::Zigzag => {
            let runs = parallel_fill(&clip_region, angle, config.spacing);
            connect_zigzag(runs, config.spacing)
        }
    }
}

/// Parallel scan lines at `angle_deg`, clipped to the region and ordered
/// boustrophedon (every other scan line reversed).
fn parallel_fill(region: &ExPolygons, angle_deg: CoordF, spacing: CoordF) -> Vec<Polyline> {
    let mut bbox = BoundingBox::new();
    for expoly in region {
        bbox.merge(&expoly.bounding_box());
    }
    if bbox.is_empty() {
        return Vec::new();
    }

    let spacing_scaled = scale(spacing);
    if spacing_scaled <= 0 {
        return Vec::new();
    }

    let angle_rad = angle_deg.to_radians();
    let (sin_a, cos_a) = angle_rad.sin_cos();

    // Cover the rotated bounding box from the center outward.
    let center = bbox.center();
    let half_diag = (((bbox.width() as f64).powi(2) + (bbox.height() as f64).powi(2)).sqrt() / 2.0)
        as Coord
        + spacing_scaled;
    let steps = (2 * half_diag / spacing_scaled + 1) as i64;

    let mut paths = Vec::new();
    let mut forward = true;
    for i in -steps / 2..=steps / 2 {
        let offset = (i * spacing_scaled) as f64;

        // Scan line direction (cos, sin); offsets step along the normal.
        let ox = center.x as f64 - offset * sin_a;
        let oy = center.y as f64 + offset * cos_a;
        let dx = cos_a * half_diag as f64;
        let dy = sin_a * half_diag as f64;

        let p1 = Point::new((ox - dx) as Coord, (oy - dy) as Coord);
        let p2 = Point::new((ox + dx) as Coord, (oy + dy) as Coord);

        let mut pieces = clip_line_to_region(p1, p2, region);
        if pieces.is_empty() {
            continue;
        }
        if !forward {
            pieces.reverse();
            for piece in &mut pieces {
                piece.reverse();
            }
        }
        forward = !forward;
        paths.extend(pieces);
    }

    paths
}

/// Clip an infinite scan line (given as a long segment) to a region.
///
/// Crossing parameters against every boundary edge are collected and
/// sorted; walking them toggles inside/outside, and the inside intervals
/// become fill segments.
fn clip_line_to_region(p1: Point, p2: Point, region: &ExPolygons) -> Vec<Polyline> {
    let mut crossings: Vec<f64> = Vec::new();
    for expoly in region {
        for ring in expoly.rings() {
            collect_crossings(p1, p2, ring, &mut crossings);
        }
    }

    if crossings.is_empty() {
        // Entirely inside or entirely outside.
        let mid = Point::new((p1.x + p2.x) / 2, (p1.y + p2.y) / 2);
        if region_contains_point(region, mid) {
            return vec![Polyline::from_points(vec![p1, p2])];
        }
        return Vec::new();
    }

    crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let lerp = |t: f64| {
        Point::new(
            p1.x + ((p2.x - p1.x) as f64 * t).round() as Coord,
            p1.y + ((p2.y - p1.y) as f64 * t).round() as Coord,
        )
    };

    let mut inside = region_contains_point(region, p1);
    let mut start_t: Option<f64> = if inside { Some(0.0) } else { None };
    let mut pieces = Vec::new();

    for &t in &crossings {
        if inside {
            if let Some(s) = start_t.take() {
                if t - s > 1e-12 {
                    pieces.push((s, t));
                }
            }
        } else {
            start_t = Some(t);
        }
        inside = !inside;
    }
    if inside {
        if let Some(s) = start_t {
            pieces.push((s, 1.0));
        }
    }

    // Tangencies and vertex grazes can unbalance the crossing count; the
    // midpoint test throws out any piece that landed outside.
    pieces
        .into_iter()
        .filter_map(|(s, t)| {
            let a = lerp(s);
            let b = lerp(t);
            let mid = Point::new((a.x + b.x) / 2, (a.y + b.y) / 2);
            if !region_contains_point(region, mid) {
                return None;
            }
            let piece = Polyline::from_points(vec![a, b]);
            (piece.length_mm() > 1e-3).then_some(piece)
        })
        .collect()
}

/// Parameters along `p1..p2` where the segment crosses the ring's edges.
fn collect_crossings(p1: Point, p2: Point, ring: &Polygon, out: &mut Vec<f64>) {
    let points = ring.points();
    let n = points.len();
    if n < 2 {
        return;
    }

    let d1x = (p2.x - p1.x) as f64;
    let d1y = (p2.y - p1.y) as f64;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let d2x = (b.x - a.x) as f64;
        let d2y = (b.y - a.y) as f64;

        let denom = d1x * d2y - d1y * d2x;
        if denom.abs() < 1e-12 {
            continue; // parallel
        }

        let wx = (a.x - p1.x) as f64;
        let wy = (a.y - p1.y) as f64;
        let t = (wx * d2y - wy * d2x) / denom;
        let s = (wx * d1y - wy * d1x) / denom;

        // Half-open edge interval keeps shared ring vertices from
        // double-counting a crossing.
        if (0.0..1.0).contains(&s) && (0.0..=1.0).contains(&t) {
            out.push(t);
        }
    }
}

/// Hexagon circumradius multiplier deriving the cell size from the line
/// spacing.
const HONEYCOMB_CELL_FACTOR: CoordF = 1.5;

/// Hexagonal cell-wall fill.
///
/// Pointy-top hexagons tessellate the bounding box; every unique cell edge
/// is clipped to the region and printed once (shared walls between
/// neighboring cells are deduplicated).
fn honeycomb_fill(region: &ExPolygons, spacing: CoordF) -> Vec<Polyline> {
    let mut bbox = BoundingBox::new();
    for expoly in region {
        bbox.merge(&expoly.bounding_box());
    }
    if bbox.is_empty() {
        return Vec::new();
    }

    let radius = spacing * HONEYCOMB_CELL_FACTOR;
    let radius_scaled = scale(radius);
    if radius_scaled <= 0 {
        return Vec::new();
    }

    // Pointy-top lattice: columns step by sqrt(3)*R, rows by 1.5*R, odd
    // rows shifted half a column.
    let col_step = scale(radius * 3.0_f64.sqrt());
    let row_step = scale(radius * 1.5);
    let pad = 2 * radius_scaled;

    let min_x = bbox.min.x - pad;
    let max_x = bbox.max.x + pad;
    let min_y = bbox.min.y - pad;
    let max_y = bbox.max.y + pad;

    let cols = ((max_x - min_x) / col_step + 2) as i64;
    let rows = ((max_y - min_y) / row_step + 2) as i64;

    // Quantized undirected edge keys for deduplication of shared walls.
    let mut seen: HashSet<(Coord, Coord, Coord, Coord)> = HashSet::new();
    let mut edge_key = |a: Point, b: Point| -> bool {
        const Q: Coord = 1000; // 1 micron quantization
        let ka = (a.x.div_euclid(Q), a.y.div_euclid(Q));
        let kb = (b.x.div_euclid(Q), b.y.div_euclid(Q));
        let key = if ka <= kb {
            (ka.0, ka.1, kb.0, kb.1)
        } else {
            (kb.0, kb.1, ka.0, ka.1)
        };
        seen.insert(key)
    };

    let mut paths = Vec::new();
    for row in 0..rows {
        let cy = min_y + row * row_step;
        let x_shift = if row % 2 == 1 { col_step / 2 } else { 0 };
        for col in 0..cols {
            let cx = min_x + col * col_step + x_shift;

            // Pointy-top hexagon vertices at 30, 90, ..., 330 degrees.
            let mut verts = [Point::new(0, 0); 6];
            for (k, vert) in verts.iter_mut().enumerate() {
                let angle = (60.0 * k as CoordF + 30.0).to_radians();
                *vert = Point::new(
                    cx + (radius_scaled as f64 * angle.cos()).round() as Coord,
                    cy + (radius_scaled as f64 * angle.sin()).round() as Coord,
                );
            }

            for k in 0..6 {
                let a = verts[k];
                let b = verts[(k + 1) % 6];
                if !edge_key(a, b) {
                    continue; // the neighboring cell already drew this wall
                }
                paths.extend(clip_line_to_region(a, b, region));
            }
        }
    }

    paths
}

/// Connect parallel runs into continuous back-and-forth paths.
///
/// A run whose start lies within two spacings of the previous run's end is
/// linked with a short printed connector; breaks larger than that start a
/// new path (disjoint region parts stay separate).
fn connect_zigzag(runs: Vec<Polyline>, spacing: CoordF) -> Vec<Polyline> {
    let max_link = spacing * 2.0;
    let mut paths: Vec<Polyline> = Vec::new();
    let mut current: Option<Polyline> = None;

    for run in runs {
        if run.is_empty() {
            continue;
        }
        match current.take() {
            None => current = Some(run),
            Some(mut chain) => {
                if chain.last_point().distance_mm(run.first_point()) <= max_link {
                    for &p in run.points() {
                        chain.push(p);
                    }
                    current = Some(chain);
                } else {
                    paths.push(chain);
                    current = Some(run);
                }
            }
        }
    }
    if let Some(chain) = current {
        paths.push(chain);
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ExPolygon;

    fn square_mm(size: f64) -> ExPolygons {
        vec![ExPolygon::new(Polygon::from_points(vec![
            Point::from_mm(0.0, 0.0),
            Point::from_mm(size, 0.0),
            Point::from_mm(size, size),
            Point::from_mm(0.0, size),
        ]))]
    }

    fn total_length(paths: &[Polyline]) -> f64 {
        paths.iter().map(|p| p.length_mm()).sum()
    }

    #[test]
    fn test_spacing_for_density() {
        assert!((InfillConfig::spacing_for_density(0.4, 20.0) - 2.0).abs() < 1e-9);
        assert!((InfillConfig::spacing_for_density(0.4, 100.0) - 0.4).abs() < 1e-9);
        // Density is clamped away from zero
        assert!(InfillConfig::spacing_for_density(0.4, 0.0).is_finite());
    }

    #[test]
    fn test_solid_lines_cover_square() {
        let region = square_mm(10.0);
        let config = InfillConfig {
            pattern: FillPattern::Lines,
            spacing: 0.4,
            overlap: 0.0,
        };
        let paths = fill_region(&region, &config, 0);

        // Roughly size/spacing lines of roughly size length each
        assert!(paths.len() >= 23 && paths.len() <= 27, "{} paths", paths.len());
        let expected = 10.0 * 10.0 / 0.4;
        assert!((total_length(&paths) - expected).abs() < expected * 0.1);
    }

    #[test]
    fn test_lines_alternate_direction_per_layer() {
        let region = square_mm(10.0);
        let config = InfillConfig {
            pattern: FillPattern::Lines,
            spacing: 2.0,
            overlap: 0.0,
        };
        let even = fill_region(&region, &config, 0);
        let odd = fill_region(&region, &config, 1);

        // Even layers run along X, odd layers along Y
        let p = even[0].points();
        assert!((p[0].y - p[p.len() - 1].y).abs() < (p[0].x - p[p.len() - 1].x).abs());
        let p = odd[0].points();
        assert!((p[0].x - p[p.len() - 1].x).abs() < (p[0].y - p[p.len() - 1].y).abs());
    }

    #[test]
    fn test_grid_doubles_spacing() {
        let region = square_mm(10.0);
        let lines = fill_region(
            &region,
            &InfillConfig {
                pattern: FillPattern::Lines,
                spacing: 1.0,
                overlap: 0.0,
            },
            0,
        );
        let grid = fill_region(
            &region,
            &InfillConfig {
                pattern: FillPattern::Grid,
                spacing: 1.0,
                overlap: 0.0,
            },
            0,
        );
        // Same density target: total lengths should be comparable
        let ratio = total_length(&grid) / total_length(&lines);
        assert!((ratio - 1.0).abs() < 0.2, "ratio {}", ratio);
    }

    #[test]
    fn test_fill_respects_hole() {
        let mut hole = Polygon::from_points(vec![
            Point::from_mm(4.0, 4.0),
            Point::from_mm(6.0, 4.0),
            Point::from_mm(6.0, 6.0),
            Point::from_mm(4.0, 6.0),
        ]);
        hole.make_cw();
        let region = vec![ExPolygon::with_holes(
            square_mm(10.0).remove(0).contour,
            vec![hole],
        )];

        let config = InfillConfig {
            pattern: FillPattern::Lines,
            spacing: 0.5,
            overlap: 0.0,
        };
        let paths = fill_region(&region, &config, 0);

        // No fill vertex may fall inside the hole
        for path in &paths {
            for p in path.points() {
                let mm = p.to_mm();
                assert!(
                    !(mm.x > 4.1 && mm.x < 5.9 && mm.y > 4.1 && mm.y < 5.9),
                    "point {:?} inside hole",
                    mm
                );
            }
        }
    }

    #[test]
    fn test_overlap_extends_past_region() {
        let region = square_mm(10.0);
        let config = InfillConfig {
            pattern: FillPattern::Lines,
            spacing: 1.0,
            overlap: 0.2,
        };
        let paths = fill_region(&region, &config, 0);
        let max_x = paths
            .iter()
            .flat_map(|p| p.points())
            .map(|p| p.to_mm().x)
            .fold(f64::MIN, f64::max);
        assert!(max_x > 10.05, "fill should reach into the wall band, got {}", max_x);
    }

    #[test]
    fn test_honeycomb_produces_cell_walls() {
        let region = square_mm(20.0);
        let config = InfillConfig {
            pattern: FillPattern::Honeycomb,
            spacing: 2.0,
            overlap: 0.0,
        };
        let paths = fill_region(&region, &config, 0);
        assert!(!paths.is_empty());

        // All pieces stay inside the region
        for path in &paths {
            for p in path.points() {
                let mm = p.to_mm();
                assert!(mm.x > -0.2 && mm.x < 20.2 && mm.y > -0.2 && mm.y < 20.2);
            }
        }

        // Cell walls are short straight pieces, not scan lines
        let longest = paths.iter().map(|p| p.length_mm()).fold(0.0, f64::max);
        assert!(longest <= 2.0 * 1.5 + 0.2, "longest {}", longest);
    }

    #[test]
    fn test_zigzag_connects_runs() {
        let region = square_mm(10.0);
        let lines = fill_region(
            &region,
            &InfillConfig {
                pattern: FillPattern::Lines,
                spacing: 2.0,
                overlap: 0.0,
            },
            0,
        );
        let zigzag = fill_region(
            &region,
            &InfillConfig {
                pattern: FillPattern::Zigzag,
                spacing: 2.0,
                overlap: 0.0,
            },
            0,
        );

        assert!(zigzag.len() < lines.len(), "zigzag should merge runs");
        assert!(total_length(&zigzag) >= total_length(&lines));
    }

    #[test]
    fn test_empty_region() {
        let config = InfillConfig {
            pattern: FillPattern::Grid,
            spacing: 1.0,
            overlap: 0.0,
        };
        assert!(fill_region(&Vec::new(), &config, 0).is_empty());
    }
}
