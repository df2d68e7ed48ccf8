//! STL file loading (host-side).
//!
//! The slicing core itself consumes an in-memory [`TriangleMesh`]; this
//! loader exists for the CLI and other hosts that start from a file.
//! Both binary and ASCII STL are handled.

use super::TriangleMesh;
use crate::geometry::Point3F;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Load a binary or ASCII STL file into a [`TriangleMesh`].
///
/// Duplicate vertices are fused by exact coordinate match so that shared
/// triangle edges reference shared vertices.
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriangleMesh> {
    let data = fs::read(path.as_ref())?;
    let triangles = if is_ascii_stl(&data) {
        parse_ascii(&data)?
    } else {
        parse_binary(&data)?
    };
    index_triangles(triangles)
}

fn is_ascii_stl(data: &[u8]) -> bool {
    // Binary files also often start with "solid"; require an ASCII "facet"
    // keyword within the first chunk to call it text.
    data.starts_with(b"solid")
        && data[..data.len().min(1024)]
            .windows(5)
            .any(|w| w == b"facet")
}

fn parse_binary(data: &[u8]) -> Result<Vec<[Point3F; 3]>> {
    if data.len() < 84 {
        return Err(Error::InvalidMesh("binary STL shorter than header".into()));
    }
    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = 84 + count * 50;
    if data.len() < expected {
        return Err(Error::InvalidMesh(format!(
            "binary STL truncated: {} triangles declared, {} bytes present",
            count,
            data.len()
        )));
    }

    let mut triangles = Vec::with_capacity(count);
    for i in 0..count {
        let base = 84 + i * 50;
        // Skip the 12-byte normal; winding defines orientation
        let mut verts = [Point3F::default(); 3];
        for (v, vert) in verts.iter_mut().enumerate() {
            let off = base + 12 + v * 12;
            *vert = Point3F::new(
                read_f32(data, off) as f64,
                read_f32(data, off + 4) as f64,
                read_f32(data, off + 8) as f64,
            );
        }
        triangles.push(verts);
    }
    Ok(triangles)
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn parse_ascii(data: &[u8]) -> Result<Vec<[Point3F; 3]>> {
    let text = std::str::from_utf8(data)
        .map_err(|_| Error::InvalidMesh("ASCII STL is not valid UTF-8".into()))?;

    let mut triangles = Vec::new();
    let mut current: Vec<Point3F> = Vec::with_capacity(3);

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("vertex") {
            let mut coords = rest.split_whitespace().map(|t| t.parse::<f64>());
            let (x, y, z) = match (coords.next(), coords.next(), coords.next()) {
                (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => (x, y, z),
                _ => return Err(Error::InvalidMesh(format!("bad vertex line: {}", line))),
            };
            current.push(Point3F::new(x, y, z));
        } else if line.starts_with("endfacet") {
            if current.len() != 3 {
                return Err(Error::InvalidMesh(format!(
                    "facet with {} vertices",
                    current.len()
                )));
            }
            triangles.push([current[0], current[1], current[2]]);
            current.clear();
        }
    }
    Ok(triangles)
}

/// Fuse per-triangle vertex soup into an indexed mesh.
fn index_triangles(triangles: Vec<[Point3F; 3]>) -> Result<TriangleMesh> {
    let mut vertex_index: HashMap<[u64; 3], u32> = HashMap::new();
    let mut vertices: Vec<Point3F> = Vec::new();
    let mut indices: Vec<[u32; 3]> = Vec::with_capacity(triangles.len());

    for tri in &triangles {
        let mut tri_idx = [0u32; 3];
        for (i, v) in tri.iter().enumerate() {
            let key = [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()];
            let idx = *vertex_index.entry(key).or_insert_with(|| {
                vertices.push(*v);
                (vertices.len() - 1) as u32
            });
            tri_idx[i] = idx;
        }
        indices.push(tri_idx);
    }

    TriangleMesh::from_data(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_roundtrip() {
        let text = "\
solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid test
";
        let triangles = parse_ascii(text.as_bytes()).unwrap();
        assert_eq!(triangles.len(), 1);
        let mesh = index_triangles(triangles).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices().len(), 3);
    }

    #[test]
    fn test_binary_parse() {
        // Hand-build a single-triangle binary STL
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]); // normal
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        data.extend_from_slice(&[0u8; 2]); // attribute byte count

        let triangles = parse_binary(&data).unwrap();
        assert_eq!(triangles.len(), 1);
        assert!((triangles[0][1].x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_fusing() {
        // Two triangles sharing an edge should share two vertices
        let a = Point3F::new(0.0, 0.0, 0.0);
        let b = Point3F::new(1.0, 0.0, 0.0);
        let c = Point3F::new(0.0, 1.0, 0.0);
        let d = Point3F::new(1.0, 1.0, 0.0);
        let mesh = index_triangles(vec![[a, b, c], [b, d, c]]).unwrap();
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_truncated_binary_rejected() {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&5u32.to_le_bytes());
        assert!(parse_binary(&data).is_err());
    }
}
