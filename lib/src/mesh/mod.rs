//! Triangle mesh container and preparation.
//!
//! The slicing core consumes an in-memory indexed triangle mesh in
//! millimeters; file decoding lives at the host boundary (see [`stl`]).
//! Before slicing, [`TriangleMesh::center_on_bed`] seats the object on the
//! build plate and verifies it fits the machine volume.

mod stl;

pub use stl::load_stl;

use crate::geometry::{BoundingBox3F, Point3F};
use crate::{CoordF, Error, Result};

/// An indexed triangle mesh.
///
/// Vertices are stored in millimeters; each triangle is a triple of vertex
/// indices with outward-facing normal implied by counter-clockwise winding.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    vertices: Vec<Point3F>,
    triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertex and triangle arrays.
    ///
    /// Fails with `InvalidMesh` if any coordinate is non-finite or any
    /// triangle references a missing vertex. Small numeric degeneracies
    /// (near-zero-area triangles) are tolerated; the cross-sectioner skips
    /// them naturally.
    pub fn from_data(vertices: Vec<Point3F>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        if let Some(i) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidMesh(format!(
                "vertex {} has non-finite coordinates",
                i
            )));
        }
        let n = vertices.len() as u32;
        for (i, tri) in triangles.iter().enumerate() {
            if tri.iter().any(|&idx| idx >= n) {
                return Err(Error::InvalidMesh(format!(
                    "triangle {} references vertex out of range",
                    i
                )));
            }
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Get the vertices.
    #[inline]
    pub fn vertices(&self) -> &[Point3F] {
        &self.vertices
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The three vertices of a triangle.
    #[inline]
    pub fn triangle_vertices(&self, index: usize) -> [Point3F; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<BoundingBox3F> {
        BoundingBox3F::from_points(&self.vertices)
    }

    /// Translate all vertices.
    pub fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF) {
        for v in &mut self.vertices {
            v.x += dx;
            v.y += dy;
            v.z += dz;
        }
    }

    /// Append another mesh's geometry to this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + base, t[1] + base, t[2] + base]),
        );
    }

    /// Center the object on the build plate and seat it at z = 0, then
    /// verify it fits within `bed` (x, y, z extents in millimeters).
    ///
    /// Returns the post-translation top of the object (`z_max`).
    pub fn center_on_bed(&mut self, bed: (CoordF, CoordF, CoordF)) -> Result<CoordF> {
        let bounds = self
            .bounds()
            .ok_or_else(|| Error::InvalidMesh("mesh has no vertices".into()))?;
        let size = bounds.size();
        if size.x <= 0.0 && size.y <= 0.0 && size.z <= 0.0 {
            return Err(Error::InvalidMesh("mesh has zero extent".into()));
        }

        let (bx, by, bz) = bed;
        self.translate(
            bx / 2.0 - size.x / 2.0 - bounds.min.x,
            by / 2.0 - size.y / 2.0 - bounds.min.y,
            -bounds.min.z,
        );

        if size.x > bx || size.y > by || size.z > bz {
            return Err(Error::OutOfVolume(format!(
                "object is {} but the bed is {:.0} x {:.0} x {:.0} mm",
                bounds, bx, by, bz
            )));
        }

        Ok(size.z)
    }

    // ========================================================================
    // Primitive constructors (demo geometry and tests)
    // ========================================================================

    /// An axis-aligned box with one corner at the origin.
    pub fn cuboid(sx: CoordF, sy: CoordF, sz: CoordF) -> Self {
        let vertices = vec![
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(sx, 0.0, 0.0),
            Point3F::new(sx, sy, 0.0),
            Point3F::new(0.0, sy, 0.0),
            Point3F::new(0.0, 0.0, sz),
            Point3F::new(sx, 0.0, sz),
            Point3F::new(sx, sy, sz),
            Point3F::new(0.0, sy, sz),
        ];
        // Two triangles per face, outward winding
        let triangles = vec![
            [0, 2, 1],
            [0, 3, 2], // bottom (z=0, normal -Z)
            [4, 5, 6],
            [4, 6, 7], // top (z=sz, normal +Z)
            [0, 1, 5],
            [0, 5, 4], // front (y=0)
            [2, 3, 7],
            [2, 7, 6], // back (y=sy)
            [1, 2, 6],
            [1, 6, 5], // right (x=sx)
            [3, 0, 4],
            [3, 4, 7], // left (x=0)
        ];
        Self {
            vertices,
            triangles,
        }
    }

    /// A cube of the given edge length centered at the origin.
    pub fn cube(size: CoordF) -> Self {
        let mut mesh = Self::cuboid(size, size, size);
        let h = size / 2.0;
        mesh.translate(-h, -h, -h);
        mesh
    }

    /// A hollow cylinder (tube) standing on z = 0.
    ///
    /// Used for vase-mode testing; `segments` controls the tessellation.
    pub fn tube(outer_radius: CoordF, inner_radius: CoordF, height: CoordF, segments: usize) -> Self {
        let n = segments.max(8);
        let mut vertices = Vec::with_capacity(n * 4);
        let mut triangles = Vec::new();

        // Ring vertex layout: [outer bottom, outer top, inner bottom, inner top] per segment
        for i in 0..n {
            let angle = (i as CoordF) / (n as CoordF) * std::f64::consts::TAU;
            let (sin, cos) = angle.sin_cos();
            vertices.push(Point3F::new(outer_radius * cos, outer_radius * sin, 0.0));
            vertices.push(Point3F::new(outer_radius * cos, outer_radius * sin, height));
            vertices.push(Point3F::new(inner_radius * cos, inner_radius * sin, 0.0));
            vertices.push(Point3F::new(inner_radius * cos, inner_radius * sin, height));
        }

        let idx = |seg: usize, which: usize| (seg % n * 4 + which) as u32;
        for i in 0..n {
            let j = i + 1;
            // Outer shell (normal outward)
            triangles.push([idx(i, 0), idx(j, 0), idx(j, 1)]);
            triangles.push([idx(i, 0), idx(j, 1), idx(i, 1)]);
            // Inner shell (normal inward, toward the axis)
            triangles.push([idx(i, 2), idx(j, 3), idx(j, 2)]);
            triangles.push([idx(i, 2), idx(i, 3), idx(j, 3)]);
            // Bottom annulus (normal -Z)
            triangles.push([idx(i, 0), idx(i, 2), idx(j, 2)]);
            triangles.push([idx(i, 0), idx(j, 2), idx(j, 0)]);
            // Top annulus (normal +Z)
            triangles.push([idx(i, 1), idx(j, 3), idx(i, 3)]);
            triangles.push([idx(i, 1), idx(j, 1), idx(j, 3)]);
        }

        Self {
            vertices,
            triangles,
        }
    }
}
