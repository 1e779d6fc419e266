//! The diagnostic predicate suite: read-only queries over a mesh.
//!
//! Every predicate here is total — malformed or inconsistent input
//! never panics or returns an `Err`, only a documented zero/sentinel
//! value (`hole_count == -1` when adjacency is non-manifold, for
//! instance). Predicates that need face-face adjacency assume the
//! caller has already run [`crate::topology::rebuild_topology_from_scratch`].

use crate::base::{BoundingBox, Point3, Vector3};
use crate::grid::FaceGrid;
use crate::intersect::{shares_a_vertex, triangles_intersect};
use crate::mesh::Mesh;
use rustc_hash::FxHashSet;

fn triangle_of(mesh: &Mesh, face_idx: u32) -> [Point3; 3] {
    let face = &mesh.faces()[face_idx as usize];
    let [a, b, c] = face.vertex;
    [
        mesh.vertices()[a as usize].position,
        mesh.vertices()[b as usize].position,
        mesh.vertices()[c as usize].position,
    ]
}

/// Number of live faces with zero area or two equal vertex indices.
pub fn degenerate_face_count(mesh: &Mesh) -> usize {
    mesh.live_faces()
        .filter(|(_, face)| Mesh::is_index_degenerate(face) || mesh.face_area(face) <= 0.0)
        .count()
}

/// Canonicalizes a face's vertex triple by rotating so the smallest
/// index leads, ignoring winding direction.
fn canonical_triple(vertex: [u32; 3]) -> (u32, u32, u32) {
    let min_pos = (0..3).min_by_key(|&i| vertex[i]).unwrap();
    (
        vertex[min_pos],
        vertex[(min_pos + 1) % 3],
        vertex[(min_pos + 2) % 3],
    )
}

/// Number of live faces sharing the same unordered vertex-index
/// triple with an earlier face.
pub fn duplicate_face_count(mesh: &Mesh) -> usize {
    let mut seen = FxHashSet::default();
    let mut duplicates = 0;
    for (_, face) in mesh.live_faces() {
        let key = canonical_triple(face.vertex);
        if !seen.insert(key) {
            duplicates += 1;
        }
    }
    duplicates
}

/// Number of live faces participating in at least one triangle-
/// triangle intersection with a different face, excluding pairs
/// sharing one or two vertex indices.
pub fn self_intersection_count(mesh: &Mesh) -> usize {
    let faces: Vec<(u32, [Point3; 3])> = mesh.live_faces().map(|(i, _)| (i, triangle_of(mesh, i))).collect();
    if faces.is_empty() {
        return 0;
    }
    let bbox = bounding_box(mesh);
    let grid = FaceGrid::build(&bbox, faces.iter().cloned());

    let vertex_of: std::collections::HashMap<u32, [u32; 3]> =
        mesh.live_faces().map(|(i, f)| (i, f.vertex)).collect();

    let mut intersecting = FxHashSet::default();
    for &(face_idx, triangle) in &faces {
        let face_bbox = BoundingBox::from_points(&triangle);
        for candidate in grid.candidates_near(&face_bbox) {
            if candidate <= face_idx {
                continue;
            }
            if shares_a_vertex(vertex_of[&face_idx], vertex_of[&candidate]) {
                continue;
            }
            let other_triangle = triangle_of(mesh, candidate);
            if triangles_intersect(triangle, other_triangle) {
                intersecting.insert(face_idx);
                intersecting.insert(candidate);
            }
        }
    }
    intersecting.len()
}

/// True iff the mesh has no border edges and no non-manifold edges.
/// Requires current adjacency.
pub fn is_watertight(mesh: &Mesh) -> bool {
    mesh.live_faces().all(|(_, face)| (0..3).all(|slot| !face.is_border_edge(slot)))
        && crate::topology::non_manifold_edge_count(mesh) == 0
}

/// True iff every interior edge shared by two faces is traversed in
/// opposite directions by each. Requires current adjacency.
pub fn is_coherently_oriented(mesh: &Mesh) -> bool {
    for (_, face) in mesh.live_faces() {
        for slot in 0..3 {
            let neighbor_idx = face.neighbor[slot];
            if neighbor_idx == crate::mesh::BORDER || face.is_border_edge(slot) {
                continue;
            }
            let (a, b) = face.edge(slot);
            let neighbor = &mesh.faces()[neighbor_idx as usize];
            let Some(na) = neighbor.local_index(a) else { return false };
            let Some(nb) = neighbor.local_index(b) else { return false };
            // The directed edge (a, b) in `face` must appear reversed,
            // i.e. as (b, a), when walked through `neighbor`'s winding.
            let walks_same_direction = (na + 1) % 3 == nb;
            if walks_same_direction {
                return false;
            }
        }
    }
    true
}

/// Sum over faces of `dot(v0, cross(v1, v2)) / 6`.
pub fn signed_volume(mesh: &Mesh) -> f32 {
    mesh.live_faces()
        .map(|(_, face)| {
            let [a, b, c] = face.vertex;
            let (a, b, c) = (
                mesh.vertices()[a as usize].position,
                mesh.vertices()[b as usize].position,
                mesh.vertices()[c as usize].position,
            );
            let cross = Vector3::new(b.x, b.y, b.z).cross(Vector3::new(c.x, c.y, c.z));
            (a.x * cross.x + a.y * cross.y + a.z * cross.z) / 6.0
        })
        .sum()
}

/// `signed_volume(mesh) > 0`.
pub fn is_positive_volume(mesh: &Mesh) -> bool { signed_volume(mesh) > 0.0 }

/// Sum of `0.5 * |(v1 - v0) x (v2 - v0)|` over live faces.
pub fn surface_area(mesh: &Mesh) -> f32 {
    mesh.live_faces().map(|(_, face)| mesh.face_area(face)).sum()
}

/// Number of connected components of the face-face adjacency graph.
/// Requires current adjacency.
pub fn shell_count(mesh: &Mesh) -> usize {
    let mut visited = FxHashSet::default();
    let mut shells = 0;
    for (start_idx, _) in mesh.live_faces() {
        if visited.contains(&start_idx) {
            continue;
        }
        shells += 1;
        let mut stack = vec![start_idx];
        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let face = &mesh.faces()[idx as usize];
            for &neighbor in &face.neighbor {
                if neighbor != crate::mesh::BORDER && mesh.faces()[neighbor as usize].is_live() && !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
    }
    shells
}

/// Count of edges with three or more incident live faces.
pub fn non_manifold_edge_count(mesh: &Mesh) -> usize { crate::topology::non_manifold_edge_count(mesh) }

/// Number of distinct closed walks along border edges. Undefined
/// (returns `-1`) if any non-manifold edge is present.
pub fn hole_count(mesh: &Mesh) -> i32 {
    if non_manifold_edge_count(mesh) > 0 {
        return -1;
    }
    // next-border-edge-around-vertex: from a border edge (a, b), the
    // next edge in the loop starts at b and is the other border edge
    // of the face incident to b in the walk. Since borders here have
    // exactly one incident face, we instead walk by chaining border
    // edges through a vertex -> outgoing-border-edge map.
    use std::collections::HashMap;
    let mut outgoing: HashMap<u32, (u32, u32)> = HashMap::new();
    for (_, face) in mesh.live_faces() {
        for slot in 0..3 {
            if face.is_border_edge(slot) {
                let (a, b) = face.edge(slot);
                outgoing.insert(a, (a, b));
            }
        }
    }
    let mut visited_starts = FxHashSet::default();
    let mut holes = 0;
    for &(start_a, _) in outgoing.values() {
        if visited_starts.contains(&start_a) {
            continue;
        }
        let mut current = start_a;
        let mut guard = 0usize;
        loop {
            if !visited_starts.insert(current) {
                break;
            }
            match outgoing.get(&current) {
                Some(&(_, next)) => current = next,
                None => break,
            }
            guard += 1;
            if guard > outgoing.len() + 1 {
                break;
            }
            if current == start_a {
                break;
            }
        }
        holes += 1;
    }
    holes
}

/// Min/max of each axis over live vertex positions. The empty
/// (non-finite) box when there are no live vertices.
pub fn bounding_box(mesh: &Mesh) -> BoundingBox {
    BoundingBox::from_points(mesh.live_vertices().map(|(_, v)| &v.position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::rebuild_topology_from_scratch;

    fn cube() -> Mesh {
        let p = [
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ];
        // Outward-facing, coherently wound triangulation of a cube.
        let idx = vec![
            0, 3, 2, 0, 2, 1, // bottom (z = -1), normal -z
            4, 5, 6, 4, 6, 7, // top (z = 1), normal +z
            0, 1, 5, 0, 5, 4, // front (y = -1)
            1, 2, 6, 1, 6, 5, // right (x = 1)
            2, 3, 7, 2, 7, 6, // back (y = 1)
            3, 0, 4, 3, 4, 7, // left (x = -1)
        ];
        Mesh::from_positions_and_indices(p.to_vec(), idx)
    }

    #[test]
    fn cube_is_watertight_and_coherently_oriented() {
        let mut mesh = cube();
        rebuild_topology_from_scratch(&mut mesh);
        assert!(is_watertight(&mesh));
        assert!(is_coherently_oriented(&mesh));
        assert_eq!(shell_count(&mesh), 1);
        assert_eq!(hole_count(&mesh), 0);
        assert!((surface_area(&mesh) - 24.0).abs() < 1e-3);
        assert!((signed_volume(&mesh).abs() - 8.0).abs() < 1e-3);
    }

    #[test]
    fn isolated_triangle_has_one_hole_and_one_shell() {
        let mut mesh = Mesh::from_positions_and_indices(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        );
        rebuild_topology_from_scratch(&mut mesh);
        assert_eq!(shell_count(&mesh), 1);
        assert_eq!(hole_count(&mesh), 1);
        assert!(!is_watertight(&mesh));
    }

    #[test]
    fn empty_mesh_has_zero_everything() {
        let mesh = Mesh::new();
        assert_eq!(degenerate_face_count(&mesh), 0);
        assert_eq!(surface_area(&mesh), 0.0);
        assert_eq!(signed_volume(&mesh), 0.0);
        assert!(bounding_box(&mesh).is_empty());
    }

    #[test]
    fn duplicate_faces_are_counted_once_each() {
        let mesh = Mesh::from_positions_and_indices(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2, 1, 2, 0],
        );
        assert_eq!(duplicate_face_count(&mesh), 1);
    }
}
