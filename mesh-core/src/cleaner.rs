//! In-place mutating operations that return a count of elements
//! removed or fixed. Every operation here bumps the mesh mark epoch
//! and leaves face-face adjacency stale — callers must rebuild
//! topology afterwards before running adjacency-dependent predicates.
//!
//! Duplicate removal works by canonical-key hashing, the same idiom
//! used for attribute dedup, generalized here to vertex positions and
//! face vertex triples.

use crate::base::Point3;
use crate::mesh::{ElementFlags, Mesh, BORDER};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

fn bit_exact_key(p: Point3) -> (u32, u32, u32) { (p.x.to_bits(), p.y.to_bits(), p.z.to_bits()) }

/// Merges vertices at bit-exact identical positions and rewrites face
/// indices onto the surviving (lowest-index) vertex. Exact `==`
/// equality, not a tolerance-based merge — the tolerance this might
/// eventually need is an explicit open question, not silently baked
/// in here.
///
/// Returns the number of vertices merged away (not physically
/// removed: merged vertices are flagged deleted). When
/// `remove_degenerate` is set, faces that become degenerate as a
/// result are flagged deleted too.
pub fn merge_duplicate_vertices(mesh: &mut Mesh, remove_degenerate: bool) -> usize {
    let mut survivor_of: FxHashMap<(u32, u32, u32), u32> = FxHashMap::default();
    let mut remap = vec![BORDER; mesh.vertices().len()];
    let mut merged = 0;

    for (idx, vertex) in mesh.vertices().iter().enumerate() {
        if !vertex.is_live() {
            continue;
        }
        let key = bit_exact_key(vertex.position);
        match survivor_of.get(&key) {
            Some(&survivor) => {
                remap[idx] = survivor;
            }
            None => {
                survivor_of.insert(key, idx as u32);
                remap[idx] = idx as u32;
            }
        }
    }

    for (idx, vertex) in mesh.vertices_mut().iter_mut().enumerate() {
        if vertex.is_live() && remap[idx] != idx as u32 {
            vertex.flags.set(ElementFlags::DELETED);
            merged += 1;
        }
    }

    for face in mesh.faces_mut() {
        if !face.is_live() {
            continue;
        }
        for v in &mut face.vertex {
            if remap[*v as usize] != BORDER {
                *v = remap[*v as usize];
            }
        }
    }

    if remove_degenerate {
        for face in mesh.faces_mut() {
            if face.is_live() && Mesh::is_index_degenerate(face) {
                face.flags.set(ElementFlags::DELETED);
            }
        }
    }

    mesh.bump_mark();
    merged
}

fn canonical_triple(vertex: [u32; 3]) -> (u32, u32, u32) {
    let min_pos = (0..3).min_by_key(|&i| vertex[i]).unwrap();
    (vertex[min_pos], vertex[(min_pos + 1) % 3], vertex[(min_pos + 2) % 3])
}

/// Flags every face after the first occurrence of its canonical
/// (rotation-normalized, winding-ignoring) vertex triple as deleted.
/// Returns the number removed.
pub fn remove_duplicate_faces(mesh: &mut Mesh) -> usize {
    let mut seen = FxHashMap::default();
    let mut removed = 0;
    for face in mesh.faces_mut() {
        if !face.is_live() {
            continue;
        }
        let key = canonical_triple(face.vertex);
        if seen.insert(key, ()).is_some() {
            face.flags.set(ElementFlags::DELETED);
            removed += 1;
        }
    }
    mesh.bump_mark();
    removed
}

/// For each undirected edge incident to three or more live faces,
/// flags *all* incident faces deleted. Aggressive by design: the
/// repair driver relies on the hole filler to reconstruct whatever
/// geometry this opens up. Returns the number of faces removed.
pub fn remove_non_manifold_faces(mesh: &mut Mesh) -> usize {
    let bad = crate::topology::non_manifold_faces(mesh);
    for &idx in &bad {
        mesh.faces_mut()[idx as usize].flags.set(ElementFlags::DELETED);
    }
    mesh.bump_mark();
    bad.len()
}

/// Outcome of [`orient_coherently`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OrientResult {
    /// The breadth-first walk reached every live face.
    pub oriented: bool,
    /// No contradiction (two faces both demanding the shared edge
    /// flip in opposite ways) was encountered.
    pub orientable: bool,
}

/// Flood-fills face-face adjacency from an arbitrary seed face,
/// flipping a neighbor's winding (swap its second and third vertex
/// index, and its matching neighbor slots) whenever crossing an edge
/// would otherwise produce two faces walking that edge in the same
/// direction. Requires current adjacency; leaves it stale on return.
///
/// A face can be reached twice by two different paths through the
/// dual graph; when that happens its winding is already fixed, so a
/// shared edge walked the same direction by both faces signals a
/// genuine contradiction rather than something still to fix.
/// Non-orientable input (e.g. a Möbius-like loop) is left partially
/// flipped; the caller is expected to treat that as a failed repair
/// step per [`OrientResult::orientable`].
pub fn orient_coherently(mesh: &mut Mesh) -> OrientResult {
    let seed = match mesh.live_faces().next() {
        Some((idx, _)) => idx,
        None => return OrientResult { oriented: true, orientable: true },
    };

    let mut visited = vec![false; mesh.faces().len()];
    let mut queue = VecDeque::new();
    visited[seed as usize] = true;
    queue.push_back(seed);
    let mut orientable = true;
    let mut visited_count = 1usize;

    while let Some(face_idx) = queue.pop_front() {
        let face = mesh.faces()[face_idx as usize];
        for slot in 0..3 {
            let neighbor_idx = face.neighbor[slot];
            if neighbor_idx == BORDER {
                continue;
            }
            let (a, b) = face.edge(slot);
            let neighbor = mesh.faces()[neighbor_idx as usize];
            let (Some(na), Some(nb)) = (neighbor.local_index(a), neighbor.local_index(b)) else {
                orientable = false;
                continue;
            };
            let walks_same_direction = (na + 1) % 3 == nb;
            if visited[neighbor_idx as usize] {
                // Reached via a second path (a cycle in the dual
                // graph). Its winding is already fixed, so a shared
                // edge walked the same direction by both faces is a
                // genuine contradiction rather than something to fix.
                if walks_same_direction {
                    orientable = false;
                }
                continue;
            }
            if walks_same_direction {
                flip_face(mesh, neighbor_idx);
            }
            visited[neighbor_idx as usize] = true;
            visited_count += 1;
            queue.push_back(neighbor_idx);
        }
    }

    let oriented = visited_count == mesh.live_face_count();
    mesh.bump_mark();
    OrientResult { oriented, orientable }
}

fn flip_face(mesh: &mut Mesh, idx: u32) {
    let face = &mut mesh.faces_mut()[idx as usize];
    face.vertex.swap(1, 2);
    face.neighbor.swap(1, 2);
    let b0 = face.is_border_edge(1);
    let b1 = face.is_border_edge(2);
    face.set_border_edge(1, b1);
    face.set_border_edge(2, b0);
}

/// Swaps the second and third vertex indices of every live face,
/// reversing the mesh's global winding (and hence the sign of its
/// signed volume).
pub fn flip_mesh(mesh: &mut Mesh) {
    let live: Vec<u32> = mesh.live_faces().map(|(i, _)| i).collect();
    for idx in live {
        flip_face(mesh, idx);
    }
    mesh.bump_mark();
}
