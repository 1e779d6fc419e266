//! Face-face adjacency construction.
//!
//! Adjacency is rebuilt from scratch by hashing undirected edge keys
//! to `(face, edge-slot)` pairs in `O(F)` expected time, generalized
//! to also flag non-manifold edges instead of assuming manifold
//! input.

use crate::mesh::{ElementFlags, Mesh, BORDER};
use rustc_hash::FxHashMap;

/// An undirected edge identified by its two endpoint vertex indices,
/// stored with the smaller index first so that both windings of the
/// same edge hash identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EdgeKey(u32, u32);

impl EdgeKey {
    fn new(a: u32, b: u32) -> Self {
        if a <= b { EdgeKey(a, b) } else { EdgeKey(b, a) }
    }
}

/// Rebuilds face-face adjacency and border/non-manifold flags for
/// every live face in `mesh`, then bumps the mesh's mark epoch.
///
/// Deleted faces are left untouched (their neighbor slots are
/// meaningless) and never considered as a neighbor candidate. An edge
/// incident to three or more live faces is non-manifold: none of its
/// incident faces get a neighbor pairing across that edge, and each
/// gets its face-level [`ElementFlags::BORDER`]-adjacent non-manifold
/// state recorded instead (see [`non_manifold_faces`]).
pub fn rebuild_topology_from_scratch(mesh: &mut Mesh) {
    let mut edge_faces: FxHashMap<EdgeKey, Vec<(u32, usize)>> = FxHashMap::default();

    for (face_idx, face) in mesh.live_faces() {
        for slot in 0..3 {
            let (a, b) = face.edge(slot);
            edge_faces.entry(EdgeKey::new(a, b)).or_default().push((face_idx, slot));
        }
    }

    // Reset adjacency on all live faces before repopulating it.
    for face in mesh.faces_mut() {
        if !face.is_live() {
            continue;
        }
        face.neighbor = [BORDER; 3];
        for slot in 0..3 {
            face.set_border_edge(slot, true);
        }
        face.flags.clear(ElementFlags::BORDER);
    }

    for incidences in edge_faces.values() {
        match incidences.as_slice() {
            [] | [_] => {
                // Single incidence: already left as a border edge above.
            }
            [(fa, sa), (fb, sb)] => {
                let (fa, sa, fb, sb) = (*fa, *sa, *fb, *sb);
                mesh.faces_mut()[fa as usize].neighbor[sa] = fb;
                mesh.faces_mut()[fa as usize].set_border_edge(sa, false);
                mesh.faces_mut()[fb as usize].neighbor[sb] = fa;
                mesh.faces_mut()[fb as usize].set_border_edge(sb, false);
            }
            non_manifold => {
                // Three or more faces share this edge: no pairing is
                // well-defined, so every incident face keeps the edge
                // marked border but additionally gets flagged so the
                // predicate suite and cleaner can find it again
                // without re-hashing edges.
                for (face_idx, _slot) in non_manifold {
                    mesh.faces_mut()[*face_idx as usize].flags.set(ElementFlags::BORDER);
                }
            }
        }
    }

    // A face touching a non-manifold edge keeps BORDER set on the
    // flags word even though the specific edge slot may not be a
    // geometric border; mark endpoint vertices as border too so
    // vertex-level predicates agree with face-level ones.
    let border_vertices: Vec<u32> = mesh
        .live_faces()
        .flat_map(|(_, face)| {
            (0..3)
                .filter(|&slot| face.is_border_edge(slot) || face.flags.has(ElementFlags::BORDER))
                .flat_map(|slot| {
                    let (a, b) = face.edge(slot);
                    [a, b]
                })
                .collect::<Vec<_>>()
        })
        .collect();
    for v in border_vertices {
        mesh.vertices_mut()[v as usize].flags.set(ElementFlags::BORDER);
    }

    mesh.bump_mark();
}

/// Indices of every live face incident to at least one non-manifold
/// edge (three or more incident faces), without rebuilding adjacency.
pub fn non_manifold_faces(mesh: &Mesh) -> Vec<u32> {
    let mut edge_counts: FxHashMap<EdgeKey, u32> = FxHashMap::default();
    for (_, face) in mesh.live_faces() {
        for slot in 0..3 {
            let (a, b) = face.edge(slot);
            *edge_counts.entry(EdgeKey::new(a, b)).or_insert(0) += 1;
        }
    }
    mesh.live_faces()
        .filter(|(_, face)| (0..3).any(|slot| {
            let (a, b) = face.edge(slot);
            edge_counts.get(&EdgeKey::new(a, b)).copied().unwrap_or(0) >= 3
        }))
        .map(|(idx, _)| idx)
        .collect()
}

/// Number of undirected edges incident to three or more live faces.
pub fn non_manifold_edge_count(mesh: &Mesh) -> usize {
    let mut edge_counts: FxHashMap<EdgeKey, u32> = FxHashMap::default();
    for (_, face) in mesh.live_faces() {
        for slot in 0..3 {
            let (a, b) = face.edge(slot);
            *edge_counts.entry(EdgeKey::new(a, b)).or_insert(0) += 1;
        }
    }
    edge_counts.values().filter(|&&count| count >= 3).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Point3;

    fn two_triangles_sharing_an_edge() -> Mesh {
        Mesh::from_positions_and_indices(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 1, 3, 2],
        )
    }

    #[test]
    fn shared_edge_is_paired_and_not_border() {
        let mut mesh = two_triangles_sharing_an_edge();
        rebuild_topology_from_scratch(&mut mesh);
        assert!(mesh.faces()[0].neighbor.contains(&1));
        assert!(mesh.faces()[1].neighbor.contains(&0));
        assert_eq!(non_manifold_edge_count(&mesh), 0);
    }

    #[test]
    fn lone_triangle_is_all_border() {
        let mut mesh = Mesh::from_positions_and_indices(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        );
        rebuild_topology_from_scratch(&mut mesh);
        let face = &mesh.faces()[0];
        assert!((0..3).all(|slot| face.is_border_edge(slot)));
    }

    #[test]
    fn three_faces_sharing_one_edge_is_non_manifold() {
        let mut mesh = Mesh::from_positions_and_indices(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(-1.0, 0.5, 0.5),
            ],
            vec![0, 1, 2, 0, 3, 1, 0, 1, 4],
        );
        rebuild_topology_from_scratch(&mut mesh);
        assert_eq!(non_manifold_edge_count(&mesh), 1);
        assert_eq!(non_manifold_faces(&mesh).len(), 3);
        for (_, face) in mesh.live_faces() {
            assert!(face.flags.has(ElementFlags::BORDER));
        }
    }
}
