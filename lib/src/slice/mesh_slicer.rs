//! Mesh cross-sectioning: triangle/plane intersection and contour stitching.
//!
//! For every slice elevation the mesh is intersected with a horizontal
//! plane, producing one line segment per triangle whose z-range strictly
//! brackets the plane. Segments are stitched into closed rings by matching
//! endpoints through a spatial hash, then assembled into polygons with
//! holes.
//!
//! Planes that would pass exactly through a mesh vertex are nudged upward
//! by a small deterministic epsilon first; this removes the degenerate
//! vertex-on-plane and edge-on-plane cases without changing topology.
//! Chains that cannot be closed (non-manifold geometry) are discarded and
//! reported as warnings rather than failing the layer.

use crate::geometry::{ExPolygon, ExPolygons, Point, Point3F, Polygon};
use crate::mesh::TriangleMesh;
use crate::{scale, Coord, CoordF, Error, Result, Warning};
use std::collections::HashMap;

/// Detection tolerance for a vertex lying on the slicing plane.
const ON_PLANE_EPSILON: CoordF = 1e-9;

/// Deterministic upward nudge applied while a vertex lies on the plane (mm).
const PLANE_NUDGE: CoordF = 1e-6;

/// Endpoint fuse tolerance for stitching (mm).
const FUSE_TOLERANCE: CoordF = 1e-5;

/// Spatial hash cell edge in scaled units. Must exceed the scaled fuse
/// tolerance so a 3x3 neighborhood always covers the search radius.
const HASH_CELL: Coord = 64;

/// An unstitched cross-section segment, oriented so the solid interior
/// lies to its left.
#[derive(Clone, Copy, Debug)]
struct SliceSegment {
    a: Point,
    b: Point,
}

/// Slice a mesh at the given elevations.
///
/// `tick` is invoked periodically with a progress fraction; returning
/// `false` aborts the operation with [`Error::Cancelled`]. Open chains are
/// recorded in `warnings` (at most once per layer) and skipped.
pub fn slice_mesh_with(
    mesh: &TriangleMesh,
    zs: &[CoordF],
    warnings: &mut Vec<Warning>,
    mut tick: impl FnMut(CoordF) -> bool,
) -> Result<Vec<ExPolygons>> {
    if mesh.is_empty() || zs.is_empty() {
        return Ok(vec![Vec::new(); zs.len()]);
    }

    let planes = nudged_planes(mesh, zs);
    let mut segments: Vec<Vec<SliceSegment>> = vec![Vec::new(); planes.len()];

    // Triangle-major sweep: each triangle contributes to every plane its
    // z-range strictly brackets.
    let triangle_count = mesh.triangle_count();
    for tri_idx in 0..triangle_count {
        if tri_idx % 4096 == 0 && !tick(0.5 * tri_idx as CoordF / triangle_count as CoordF) {
            return Err(Error::Cancelled);
        }

        let verts = mesh.triangle_vertices(tri_idx);
        let min_z = verts[0].z.min(verts[1].z).min(verts[2].z);
        let max_z = verts[0].z.max(verts[1].z).max(verts[2].z);

        let first = planes.partition_point(|&z| z <= min_z);
        let last = planes.partition_point(|&z| z < max_z);

        for layer_idx in first..last {
            if let Some(segment) = slice_triangle(&verts, planes[layer_idx]) {
                segments[layer_idx].push(segment);
            }
        }
    }

    let layer_count = segments.len();
    let mut outlines = Vec::with_capacity(layer_count);
    for (layer_idx, layer_segments) in segments.into_iter().enumerate() {
        if layer_idx % 16 == 0 && !tick(0.5 + 0.5 * layer_idx as CoordF / layer_count as CoordF) {
            return Err(Error::Cancelled);
        }
        let rings = chain_segments(layer_segments, layer_idx, warnings);
        outlines.push(make_expolygons(rings));
    }

    Ok(outlines)
}

/// Slice a mesh at the given elevations, collecting warnings.
pub fn slice_mesh(
    mesh: &TriangleMesh,
    zs: &[CoordF],
    warnings: &mut Vec<Warning>,
) -> Vec<ExPolygons> {
    // Infallible without a cancelling tick
    slice_mesh_with(mesh, zs, warnings, |_| true).unwrap_or_default()
}

/// Slice a mesh at a single elevation.
pub fn slice_mesh_at_z(mesh: &TriangleMesh, z: CoordF) -> ExPolygons {
    let mut warnings = Vec::new();
    slice_mesh(mesh, &[z], &mut warnings)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Compute the final plane elevations: each requested z is nudged upward
/// by [`PLANE_NUDGE`] while any mesh vertex lies on it.
fn nudged_planes(mesh: &TriangleMesh, zs: &[CoordF]) -> Vec<CoordF> {
    let mut vertex_zs: Vec<CoordF> = mesh.vertices().iter().map(|v| v.z).collect();
    vertex_zs.sort_by(|a, b| a.partial_cmp(b).expect("finite z validated on input"));

    zs.iter()
        .map(|&z| {
            let mut plane = z;
            while touches_vertex(&vertex_zs, plane) {
                plane += PLANE_NUDGE;
            }
            plane
        })
        .collect()
}

fn touches_vertex(sorted_zs: &[CoordF], z: CoordF) -> bool {
    let start = sorted_zs.partition_point(|&v| v < z - ON_PLANE_EPSILON);
    sorted_zs
        .get(start)
        .is_some_and(|&v| v <= z + ON_PLANE_EPSILON)
}

/// Intersect one triangle with the plane `Z = z`.
///
/// The caller guarantees the triangle's z-range strictly brackets `z` and
/// no vertex lies on the plane, so exactly two edges cross it. The segment
/// is oriented so the interior of the solid is to its left, which makes
/// exterior rings come out counter-clockwise.
fn slice_triangle(verts: &[Point3F; 3], z: CoordF) -> Option<SliceSegment> {
    let mut points = [Point::new(0, 0); 2];
    let mut count = 0;

    for i in 0..3 {
        let a = verts[i];
        let b = verts[(i + 1) % 3];
        if (a.z < z) != (b.z < z) {
            if count == 2 {
                return None; // degenerate sliver, tolerated by skipping
            }
            let t = (z - a.z) / (b.z - a.z);
            let x = a.x + (b.x - a.x) * t;
            let y = a.y + (b.y - a.y) * t;
            points[count] = Point::new(scale(x), scale(y));
            count += 1;
        }
    }

    if count != 2 || points[0] == points[1] {
        return None;
    }

    // Outward normal projected to XY, rotated -90 degrees, gives the
    // direction that keeps the solid on the segment's left.
    let u = [
        verts[1].x - verts[0].x,
        verts[1].y - verts[0].y,
        verts[1].z - verts[0].z,
    ];
    let v = [
        verts[2].x - verts[0].x,
        verts[2].y - verts[0].y,
        verts[2].z - verts[0].z,
    ];
    let normal_x = u[1] * v[2] - u[2] * v[1];
    let normal_y = u[2] * v[0] - u[0] * v[2];

    let seg = points[1] - points[0];
    let along = seg.x as CoordF * normal_y - seg.y as CoordF * normal_x;
    let (a, b) = if along >= 0.0 {
        (points[0], points[1])
    } else {
        (points[1], points[0])
    };
    Some(SliceSegment { a, b })
}

#[inline]
fn cell_of(p: Point) -> (Coord, Coord) {
    (p.x.div_euclid(HASH_CELL), p.y.div_euclid(HASH_CELL))
}

/// Stitch segments into closed rings by walking endpoint matches through a
/// spatial hash keyed on quantized start points.
fn chain_segments(
    segments: Vec<SliceSegment>,
    layer: usize,
    warnings: &mut Vec<Warning>,
) -> Vec<Polygon> {
    if segments.is_empty() {
        return Vec::new();
    }

    let fuse = scale(FUSE_TOLERANCE);
    let fuse_sq = (fuse as i128) * (fuse as i128);

    let mut by_start: HashMap<(Coord, Coord), Vec<usize>> = HashMap::new();
    for (idx, seg) in segments.iter().enumerate() {
        by_start.entry(cell_of(seg.a)).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();
    let mut open_chain_seen = false;

    let find_next = |end: Point, used: &[bool]| -> Option<usize> {
        let (cx, cy) = cell_of(end);
        let mut best: Option<(usize, i128)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = by_start.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &idx in candidates {
                    if used[idx] {
                        continue;
                    }
                    let d = segments[idx].a.distance_sq(end);
                    if d <= fuse_sq && best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((idx, d));
                    }
                }
            }
        }
        best.map(|(idx, _)| idx)
    };

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;

        let mut points = vec![segments[seed].a];
        let mut end = segments[seed].b;
        let start = segments[seed].a;
        let mut closed = false;

        loop {
            if points.len() >= 3 && end.distance_sq(start) <= fuse_sq {
                closed = true;
                break;
            }
            match find_next(end, &used) {
                Some(next) => {
                    used[next] = true;
                    points.push(segments[next].a);
                    end = segments[next].b;
                }
                None => break,
            }
        }

        if closed {
            rings.push(Polygon::from_points(points));
        } else if !open_chain_seen {
            open_chain_seen = true;
            warnings.push(Warning::OpenContourDiscarded { layer });
            log::warn!("layer {}: discarding unstitchable open contour", layer);
        }
    }

    rings
}

/// Assemble classified rings into polygons with holes: counter-clockwise
/// rings are exteriors, clockwise rings are holes attached to the
/// innermost exterior containing them.
fn make_expolygons(rings: Vec<Polygon>) -> ExPolygons {
    let mut contours: Vec<Polygon> = Vec::new();
    let mut holes: Vec<Polygon> = Vec::new();

    for ring in rings {
        let area = ring.signed_area_mm2();
        if area > 0.0 {
            contours.push(ring);
        } else if area < 0.0 {
            holes.push(ring);
        }
        // Zero-area rings are degenerate and dropped
    }

    // Smallest contour first, so the first container found is the innermost
    contours.sort_by(|a, b| {
        a.area_mm2()
            .partial_cmp(&b.area_mm2())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut expolygons: Vec<ExPolygon> = contours.into_iter().map(ExPolygon::new).collect();

    for hole in holes {
        let Some(&probe) = hole.points().first() else {
            continue;
        };
        if let Some(owner) = expolygons
            .iter_mut()
            .find(|expoly| expoly.contour.contains_point(probe))
        {
            owner.add_hole(hole);
        }
        // Orphaned holes indicate a mesh defect; they are ignored
    }

    expolygons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_cube_midheight() {
        let mesh = TriangleMesh::cube(10.0);
        let result = slice_mesh_at_z(&mesh, 0.0);

        assert_eq!(result.len(), 1);
        assert!(result[0].holes.is_empty());
        assert!((result[0].area_mm2() - 100.0).abs() < 0.5);
        assert!(result[0].contour.is_ccw());
    }

    #[test]
    fn test_slice_cube_many_layers() {
        let mesh = TriangleMesh::cube(10.0);
        let zs: Vec<f64> = (-4..=4).map(|i| i as f64).collect();
        let mut warnings = Vec::new();
        let results = slice_mesh(&mesh, &zs, &mut warnings);

        assert_eq!(results.len(), zs.len());
        for (i, outline) in results.iter().enumerate() {
            assert_eq!(outline.len(), 1, "layer {} should have one contour", i);
        }
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_slice_above_and_below() {
        let mesh = TriangleMesh::cube(10.0);
        assert!(slice_mesh_at_z(&mesh, 10.0).is_empty());
        assert!(slice_mesh_at_z(&mesh, -10.0).is_empty());
    }

    #[test]
    fn test_plane_through_vertices_is_nudged() {
        // The cube's top face sits exactly at z = 5; the nudge pushes the
        // plane just above it, so the slice is empty rather than degenerate.
        let mesh = TriangleMesh::cube(10.0);
        let result = slice_mesh_at_z(&mesh, 5.0);
        assert!(result.is_empty());

        // A plane through the bottom face is nudged into the solid.
        let result = slice_mesh_at_z(&mesh, -5.0);
        assert_eq!(result.len(), 1);
        assert!((result[0].area_mm2() - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_slice_tube_has_hole() {
        let mesh = TriangleMesh::tube(15.0, 13.0, 30.0, 64);
        let result = slice_mesh_at_z(&mesh, 10.0);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        assert!(!result[0].holes[0].is_ccw());

        let expected = std::f64::consts::PI * (15.0 * 15.0 - 13.0 * 13.0);
        // The 64-gon underestimates the circle slightly
        assert!((result[0].area_mm2() - expected).abs() < expected * 0.02);
    }

    #[test]
    fn test_slice_empty_mesh() {
        let mesh = TriangleMesh::new();
        assert!(slice_mesh_at_z(&mesh, 0.0).is_empty());
    }

    #[test]
    fn test_cancellation() {
        let mesh = TriangleMesh::cube(10.0);
        let mut warnings = Vec::new();
        let result = slice_mesh_with(&mesh, &[0.0], &mut warnings, |_| false);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
