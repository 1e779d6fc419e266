//! PLY load/save, ASCII and binary-little-endian, geometry only:
//! a `vertex` element with `float x, y, z` and a `face` element with
//! a list of integer vertex indices. Quads are split into two
//! triangles along their shortest diagonal; anything above a quad is
//! fan-triangulated.

use crate::base::{distance, Point3};
use crate::errors::{Error, Result};
use crate::mesh::Mesh;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

fn io_err(path: &Path, source: std::io::Error) -> Error {
    Error::UnreadableInput { path: path.to_path_buf(), source }
}

#[derive(PartialEq)]
enum Format {
    Ascii,
    BinaryLittleEndian,
}

struct Header {
    format: Format,
    vertex_count: usize,
    face_count: usize,
    header_end: usize,
}

fn parse_header(bytes: &[u8], path: &Path) -> Result<Header> {
    let mut format = None;
    let mut vertex_count = None;
    let mut face_count = None;
    let mut offset = 0;
    let mut current_element: Option<&str> = None;

    loop {
        let newline = bytes[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| Error::InternalInconsistency("PLY header never terminated".into()))?;
        let line = std::str::from_utf8(&bytes[offset..offset + newline])
            .map_err(|_| io_err(path, std::io::Error::new(std::io::ErrorKind::InvalidData, "non-UTF8 PLY header")))?
            .trim();
        offset += newline + 1;

        if line == "end_header" {
            break;
        }
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("format") => {
                format = match tokens.next() {
                    Some("ascii") => Some(Format::Ascii),
                    Some("binary_little_endian") => Some(Format::BinaryLittleEndian),
                    other => {
                        log::error!("unsupported PLY format directive: {other:?}");
                        return Err(Error::UnsupportedFormat { path: path.to_path_buf() });
                    }
                };
            }
            Some("element") => {
                let name = tokens.next().unwrap_or("");
                let count: usize = tokens.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                current_element = None;
                if name == "vertex" {
                    vertex_count = Some(count);
                    current_element = Some("vertex");
                } else if name == "face" {
                    face_count = Some(count);
                    current_element = Some("face");
                }
            }
            _ => {
                let _ = current_element;
            }
        }
    }

    Ok(Header {
        format: format.ok_or_else(|| Error::UnsupportedFormat { path: path.to_path_buf() })?,
        vertex_count: vertex_count.unwrap_or(0),
        face_count: face_count.unwrap_or(0),
        header_end: offset,
    })
}

fn split_polygon(corners: &[u32], positions: &[Point3]) -> Vec<[u32; 3]> {
    if corners.len() == 3 {
        return vec![[corners[0], corners[1], corners[2]]];
    }
    if corners.len() == 4 {
        let (a, b, c, d) = (corners[0], corners[1], corners[2], corners[3]);
        let diag_ac = distance(positions[a as usize], positions[c as usize]);
        let diag_bd = distance(positions[b as usize], positions[d as usize]);
        return if diag_ac <= diag_bd {
            vec![[a, b, c], [a, c, d]]
        } else {
            vec![[a, b, d], [b, c, d]]
        };
    }
    (1..corners.len() - 1).map(|k| [corners[0], corners[k], corners[k + 1]]).collect()
}

/// Loads a PLY file's geometry, splitting quads along their shortest
/// diagonal and fan-triangulating anything larger.
pub fn load(path: &Path) -> Result<Mesh> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let header = parse_header(&bytes, path)?;
    let (positions, indices) = match header.format {
        Format::Ascii => load_ascii_body(&bytes[header.header_end..], &header),
        Format::BinaryLittleEndian => load_binary_body(&bytes[header.header_end..], &header),
    };
    Ok(Mesh::from_positions_and_indices(positions, indices))
}

fn load_ascii_body(body: &[u8], header: &Header) -> (Vec<Point3>, Vec<u32>) {
    let reader = BufReader::new(body);
    let mut lines = reader.lines().filter_map(|l| l.ok());
    let mut positions = Vec::with_capacity(header.vertex_count);
    for _ in 0..header.vertex_count {
        let Some(line) = lines.next() else { break };
        let mut parts = line.split_whitespace();
        let (Some(x), Some(y), Some(z)) = (parts.next(), parts.next(), parts.next()) else { continue };
        let (Ok(x), Ok(y), Ok(z)) = (x.parse(), y.parse(), z.parse()) else { continue };
        positions.push(Point3::new(x, y, z));
    }
    let mut indices = Vec::new();
    for _ in 0..header.face_count {
        let Some(line) = lines.next() else { break };
        let mut parts = line.split_whitespace();
        let Some(n) = parts.next().and_then(|s| s.parse::<usize>().ok()) else { continue };
        let corners: Vec<u32> = parts.filter_map(|s| s.parse().ok()).take(n).collect();
        if corners.len() < 3 {
            continue;
        }
        for tri in split_polygon(&corners, &positions) {
            indices.extend_from_slice(&tri);
        }
    }
    (positions, indices)
}

fn load_binary_body(body: &[u8], header: &Header) -> (Vec<Point3>, Vec<u32>) {
    let mut cursor = body;
    let mut positions = Vec::with_capacity(header.vertex_count);
    for _ in 0..header.vertex_count {
        let mut buf = [0u8; 12];
        if cursor.read_exact(&mut buf).is_err() {
            break;
        }
        let x = f32::from_le_bytes(buf[0..4].try_into().unwrap());
        let y = f32::from_le_bytes(buf[4..8].try_into().unwrap());
        let z = f32::from_le_bytes(buf[8..12].try_into().unwrap());
        positions.push(Point3::new(x, y, z));
    }
    let mut indices = Vec::new();
    for _ in 0..header.face_count {
        let mut count_buf = [0u8; 1];
        if cursor.read_exact(&mut count_buf).is_err() {
            break;
        }
        let n = count_buf[0] as usize;
        let mut corners = Vec::with_capacity(n);
        for _ in 0..n {
            let mut idx_buf = [0u8; 4];
            if cursor.read_exact(&mut idx_buf).is_err() {
                return (positions, indices);
            }
            corners.push(u32::from_le_bytes(idx_buf));
        }
        if corners.len() >= 3 {
            for tri in split_polygon(&corners, &positions) {
                indices.extend_from_slice(&tri);
            }
        }
    }
    (positions, indices)
}

/// Writes `mesh` as ASCII PLY, geometry only (triangular faces).
pub fn save_ascii(path: &Path, mesh: &Mesh) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| io_err(path, e))?;
    let faces: Vec<_> = mesh.live_faces().collect();
    writeln!(file, "ply").map_err(|e| io_err(path, e))?;
    writeln!(file, "format ascii 1.0").map_err(|e| io_err(path, e))?;
    writeln!(file, "element vertex {}", mesh.vertices().len()).map_err(|e| io_err(path, e))?;
    writeln!(file, "property float x").map_err(|e| io_err(path, e))?;
    writeln!(file, "property float y").map_err(|e| io_err(path, e))?;
    writeln!(file, "property float z").map_err(|e| io_err(path, e))?;
    writeln!(file, "element face {}", faces.len()).map_err(|e| io_err(path, e))?;
    writeln!(file, "property list uchar int vertex_index").map_err(|e| io_err(path, e))?;
    writeln!(file, "end_header").map_err(|e| io_err(path, e))?;
    for vertex in mesh.vertices() {
        writeln!(file, "{} {} {}", vertex.position.x, vertex.position.y, vertex.position.z)
            .map_err(|e| io_err(path, e))?;
    }
    for (_, face) in &faces {
        writeln!(file, "3 {} {} {}", face.vertex[0], face.vertex[1], face.vertex[2]).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trip_preserves_geometry() {
        let mesh = Mesh::from_positions_and_indices(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        );
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mesh_core_test_{}.ply", std::process::id()));
        save_ascii(&path, &mesh).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.live_face_count(), 1);
        assert_eq!(loaded.live_vertex_count(), 3);
    }

    #[test]
    fn quad_face_splits_along_shortest_diagonal() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let tris = split_polygon(&[0, 1, 2, 3], &positions);
        assert_eq!(tris.len(), 2);
    }
}
