//! Format dispatch by case-insensitive file extension. Unknown
//! extensions fail on both load and save. Default export for `.stl`
//! is binary, per the external interface contract.

pub mod obj;
pub mod ply;
pub mod stl;

use crate::cleaner::merge_duplicate_vertices;
use crate::errors::{Error, Result};
use crate::mesh::Mesh;
use std::path::Path;

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Loads a mesh from `path`, dispatching on its extension, then
/// merges bit-exact duplicate vertices (with degenerate removal
/// disabled) per the post-load contract.
///
/// The second element is the list of non-critical decode warnings
/// collected while parsing; only the OBJ reader currently produces
/// any, so it is empty for STL and PLY input.
pub fn load(path: &Path) -> Result<(Mesh, Vec<String>)> {
    let (mut mesh, warnings) = match extension_of(path).as_deref() {
        Some("stl") => (stl::load(path)?, Vec::new()),
        Some("obj") => obj::load(path)?,
        Some("ply") => (ply::load(path)?, Vec::new()),
        _ => return Err(Error::UnsupportedFormat { path: path.to_path_buf() }),
    };
    merge_duplicate_vertices(&mut mesh, false);
    Ok((mesh, warnings))
}

/// Saves `mesh` to `path`, dispatching on its extension. `.stl`
/// exports binary by default.
pub fn save(path: &Path, mesh: &Mesh) -> Result<()> {
    match extension_of(path).as_deref() {
        Some("stl") => stl::save_binary(path, mesh),
        Some("obj") => obj::save(path, mesh),
        Some("ply") => ply::save_ascii(path, mesh),
        _ => Err(Error::UnsupportedFormat { path: path.to_path_buf() }),
    }
}
