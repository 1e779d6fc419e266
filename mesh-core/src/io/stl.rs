//! STL load/save, binary and ASCII.
//!
//! Binary is a fixed 50-byte-per-face record after an 80-byte header
//! and a little-endian face count; ASCII is the `solid`/`facet
//! normal`/`outer loop`/`vertex`/`endloop`/`endfacet`/`endsolid`
//! grammar, read leniently on whitespace.

use crate::base::Point3;
use crate::errors::{Error, Result};
use crate::mesh::Mesh;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

fn io_err(path: &Path, source: std::io::Error) -> Error {
    Error::UnreadableInput { path: path.to_path_buf(), source }
}

fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < 84 {
        return false;
    }
    // A `solid` header does not rule out binary: the authoritative
    // check is whether the declared face count matches the remaining
    // byte length.
    let declared = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    bytes.len() == 84 + declared * 50
}

/// Loads an STL file (binary or ASCII, auto-detected), merging
/// bit-exact duplicate vertex positions across faces as they're read
/// in, per the binary format's contract.
pub fn load(path: &Path) -> Result<Mesh> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    if is_binary(&bytes) {
        load_binary(path, &bytes)
    } else {
        load_ascii(path, &bytes)
    }
}

fn dedup_key(p: Point3) -> (u32, u32, u32) { (p.x.to_bits(), p.y.to_bits(), p.z.to_bits()) }

struct VertexPool {
    positions: Vec<Point3>,
    index_of: rustc_hash::FxHashMap<(u32, u32, u32), u32>,
}

impl VertexPool {
    fn new() -> Self { VertexPool { positions: Vec::new(), index_of: rustc_hash::FxHashMap::default() } }

    fn intern(&mut self, p: Point3) -> u32 {
        let key = dedup_key(p);
        if let Some(&idx) = self.index_of.get(&key) {
            return idx;
        }
        let idx = self.positions.len() as u32;
        self.positions.push(p);
        self.index_of.insert(key, idx);
        idx
    }
}

fn load_binary(path: &Path, bytes: &[u8]) -> Result<Mesh> {
    let mut cursor = &bytes[80..];
    let mut count_buf = [0u8; 4];
    cursor.read_exact(&mut count_buf).map_err(|e| io_err(path, e))?;
    let face_count = u32::from_le_bytes(count_buf) as usize;

    let mut pool = VertexPool::new();
    let mut indices = Vec::with_capacity(face_count * 3);

    for _ in 0..face_count {
        let mut record = [0u8; 50];
        cursor.read_exact(&mut record).map_err(|e| io_err(path, e))?;
        // bytes 0..12 are the facet normal, ignored on load; the core
        // recomputes geometric normals itself.
        for v in 0..3 {
            let base = 12 + v * 12;
            let x = f32::from_le_bytes(record[base..base + 4].try_into().unwrap());
            let y = f32::from_le_bytes(record[base + 4..base + 8].try_into().unwrap());
            let z = f32::from_le_bytes(record[base + 8..base + 12].try_into().unwrap());
            indices.push(pool.intern(Point3::new(x, y, z)));
        }
    }

    Ok(Mesh::from_positions_and_indices(pool.positions, indices))
}

fn load_ascii(path: &Path, bytes: &[u8]) -> Result<Mesh> {
    let reader = BufReader::new(bytes);
    let mut pool = VertexPool::new();
    let mut indices = Vec::new();
    let mut current_face: Vec<u32> = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| io_err(path, e))?;
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("vertex") {
            let mut parts = rest.split_whitespace();
            let (Some(x), Some(y), Some(z)) = (parts.next(), parts.next(), parts.next()) else {
                log::warn!("malformed STL vertex line, skipping: {trimmed}");
                continue;
            };
            let (Ok(x), Ok(y), Ok(z)) = (x.parse::<f32>(), y.parse::<f32>(), z.parse::<f32>()) else {
                log::warn!("non-numeric STL vertex line, skipping: {trimmed}");
                continue;
            };
            current_face.push(pool.intern(Point3::new(x, y, z)));
        } else if trimmed.starts_with("endfacet") {
            if current_face.len() == 3 {
                indices.extend_from_slice(&current_face);
            } else if !current_face.is_empty() {
                log::warn!("STL facet with {} vertices, expected 3, skipping", current_face.len());
            }
            current_face.clear();
        }
    }

    Ok(Mesh::from_positions_and_indices(pool.positions, indices))
}

/// Writes `mesh` as binary STL (the default export format for the
/// `.stl` extension). Attribute byte count is always written as 0.
pub fn save_binary(path: &Path, mesh: &Mesh) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| io_err(path, e))?;
    let header = [0u8; 80];
    file.write_all(&header).map_err(|e| io_err(path, e))?;
    let faces: Vec<_> = mesh.live_faces().collect();
    file.write_all(&(faces.len() as u32).to_le_bytes()).map_err(|e| io_err(path, e))?;
    for (_, face) in &faces {
        let normal = mesh.face_geometric_normal(face);
        for comp in [normal.x, normal.y, normal.z] {
            file.write_all(&comp.to_le_bytes()).map_err(|e| io_err(path, e))?;
        }
        for &v in &face.vertex {
            let p = mesh.vertices()[v as usize].position;
            for comp in [p.x, p.y, p.z] {
                file.write_all(&comp.to_le_bytes()).map_err(|e| io_err(path, e))?;
            }
        }
        file.write_all(&[0u8; 2]).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

/// Writes `mesh` as ASCII STL.
pub fn save_ascii(path: &Path, mesh: &Mesh) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| io_err(path, e))?;
    writeln!(file, "solid mesh_core").map_err(|e| io_err(path, e))?;
    for (_, face) in mesh.live_faces() {
        let normal = mesh.face_geometric_normal(face);
        writeln!(file, "facet normal {} {} {}", normal.x, normal.y, normal.z).map_err(|e| io_err(path, e))?;
        writeln!(file, "outer loop").map_err(|e| io_err(path, e))?;
        for &v in &face.vertex {
            let p = mesh.vertices()[v as usize].position;
            writeln!(file, "vertex {} {} {}", p.x, p.y, p.z).map_err(|e| io_err(path, e))?;
        }
        writeln!(file, "endloop").map_err(|e| io_err(path, e))?;
        writeln!(file, "endfacet").map_err(|e| io_err(path, e))?;
    }
    writeln!(file, "endsolid mesh_core").map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        Mesh::from_positions_and_indices(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn binary_round_trip_preserves_geometry() {
        let mesh = unit_triangle();
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mesh_core_test_{}.stl", std::process::id()));
        save_binary(&path, &mesh).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.live_face_count(), 1);
        assert_eq!(loaded.live_vertex_count(), 3);
    }

    #[test]
    fn ascii_round_trip_preserves_geometry() {
        let mesh = unit_triangle();
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mesh_core_test_ascii_{}.stl", std::process::id()));
        save_ascii(&path, &mesh).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.live_face_count(), 1);
        assert_eq!(loaded.live_vertex_count(), 3);
    }
}
