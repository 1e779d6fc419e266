//! OBJ load/save, geometry only: `v x y z` and `f i j k` with 1-based
//! indices. No materials, no texture/normal indices. Unrecognised
//! directives are logged and skipped rather than treated as fatal.

use crate::base::Point3;
use crate::errors::{Error, Result};
use crate::mesh::Mesh;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

fn io_err(path: &Path, source: std::io::Error) -> Error {
    Error::UnreadableInput { path: path.to_path_buf(), source }
}

/// Parses face vertex tokens of the form `i`, `i/j`, `i/j/k`, or
/// `i//k`, keeping only the position index.
fn parse_face_index(token: &str) -> Option<i64> {
    token.split('/').next()?.parse::<i64>().ok()
}

/// Loads an OBJ file's geometry (positions and triangle faces).
/// Faces with more than three vertices are fan-triangulated from
/// their first vertex; directives other than `v`/`f` are skipped.
///
/// Malformed lines are non-critical: they are skipped rather than
/// failing the whole load, each one logged via `log::warn!` and also
/// collected into the returned warning list so a caller (the
/// reference CLI, for instance) can surface them without re-parsing
/// the file itself.
pub fn load(path: &Path) -> Result<(Mesh, Vec<String>)> {
    let file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(file);
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    let mut warnings = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| io_err(path, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        let Some(directive) = tokens.next() else { continue };
        match directive {
            "v" => {
                let rest: Vec<&str> = tokens.collect();
                if rest.len() < 3 {
                    let msg = format!("malformed OBJ vertex line, skipping: {trimmed}");
                    log::warn!("{msg}");
                    warnings.push(msg);
                    continue;
                }
                let Ok(coords) = rest[0..3].iter().map(|s| s.parse::<f32>()).collect::<std::result::Result<Vec<_>, _>>() else {
                    let msg = format!("non-numeric OBJ vertex line, skipping: {trimmed}");
                    log::warn!("{msg}");
                    warnings.push(msg);
                    continue;
                };
                positions.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            "f" => {
                let corners: Vec<u32> = tokens
                    .filter_map(parse_face_index)
                    .map(|i| if i > 0 { (i - 1) as u32 } else { (positions.len() as i64 + i) as u32 })
                    .collect();
                if corners.len() < 3 {
                    let msg = format!("OBJ face with fewer than 3 vertices, skipping: {trimmed}");
                    log::warn!("{msg}");
                    warnings.push(msg);
                    continue;
                }
                for k in 1..corners.len() - 1 {
                    indices.extend_from_slice(&[corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {
                log::debug!("ignoring unrecognised OBJ directive: {directive}");
            }
        }
    }

    Ok((Mesh::from_positions_and_indices(positions, indices), warnings))
}

/// Writes `mesh`'s geometry as OBJ: one `v` line per live vertex, one
/// `f` line per live face, 1-based indices.
pub fn save(path: &Path, mesh: &Mesh) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| io_err(path, e))?;
    for vertex in mesh.vertices() {
        writeln!(file, "v {} {} {}", vertex.position.x, vertex.position.y, vertex.position.z)
            .map_err(|e| io_err(path, e))?;
    }
    for (_, face) in mesh.live_faces() {
        writeln!(
            file,
            "f {} {} {}",
            face.vertex[0] + 1,
            face.vertex[1] + 1,
            face.vertex[2] + 1
        )
        .map_err(|e| io_err(path, e))?;
    }
    Ok(())
}
