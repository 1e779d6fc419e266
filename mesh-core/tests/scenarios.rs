//! End-to-end scenarios over the reference cube (side 2, centred at
//! the origin: 8 vertices, 12 faces) and its deliberately broken
//! variants, exercising the full store -> topology -> predicates ->
//! repair pipeline the way a caller would.

use mesh_core::cleaner::flip_mesh;
use mesh_core::mesh::Mesh;
use mesh_core::predicates;
use mesh_core::repair::{repair, RepairPolicy};
use mesh_core::report::DiagnosticRecord;
use mesh_core::topology::rebuild_topology_from_scratch;

fn cube_positions() -> Vec<mesh_core::base::Point3> {
    use mesh_core::base::Point3;
    vec![
        Point3::new(-1.0, -1.0, -1.0),
        Point3::new(1.0, -1.0, -1.0),
        Point3::new(1.0, 1.0, -1.0),
        Point3::new(-1.0, 1.0, -1.0),
        Point3::new(-1.0, -1.0, 1.0),
        Point3::new(1.0, -1.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(-1.0, 1.0, 1.0),
    ]
}

const CUBE_FACES: [u32; 36] = [
    0, 3, 2, 0, 2, 1, // bottom
    4, 5, 6, 4, 6, 7, // top
    0, 1, 5, 0, 5, 4, // front
    1, 2, 6, 1, 6, 5, // right
    2, 3, 7, 2, 7, 6, // back
    3, 0, 4, 3, 4, 7, // left
];

fn perfect_cube() -> Mesh {
    Mesh::from_positions_and_indices(cube_positions(), CUBE_FACES.to_vec())
}

fn offset_cube(dx: f32) -> Mesh {
    use mesh_core::base::Point3;
    let positions: Vec<Point3> = cube_positions().into_iter().map(|p| Point3::new(p.x + dx, p.y, p.z)).collect();
    Mesh::from_positions_and_indices(positions, CUBE_FACES.to_vec())
}

fn two_disjoint_cubes() -> Mesh {
    let mut a = perfect_cube();
    let b = offset_cube(10.0);
    let vertex_offset = a.vertices().len() as u32;
    for v in b.vertices() {
        a.push_vertex(*v);
    }
    for face in b.faces() {
        let mut f = *face;
        f.vertex = f.vertex.map(|v| v + vertex_offset);
        a.push_face(f);
    }
    a
}

fn cube_missing_one_face() -> Mesh {
    // drop the two triangles of the top face (indices 6,7 in CUBE_FACES)
    let mut idx = CUBE_FACES.to_vec();
    idx.drain(6..12);
    Mesh::from_positions_and_indices(cube_positions(), idx)
}

fn cube_inverted() -> Mesh {
    let mut mesh = perfect_cube();
    rebuild_topology_from_scratch(&mut mesh);
    flip_mesh(&mut mesh);
    mesh
}

fn cube_one_misoriented_face() -> Mesh {
    let mut idx = CUBE_FACES.to_vec();
    idx.swap(1, 2); // reverse winding of the first bottom triangle only
    Mesh::from_positions_and_indices(cube_positions(), idx)
}

fn three_faces_sharing_one_edge() -> Mesh {
    use mesh_core::base::Point3;
    Mesh::from_positions_and_indices(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(-1.0, 0.5, 0.5),
        ],
        vec![0, 1, 2, 0, 3, 1, 0, 1, 4],
    )
}

#[test]
fn perfect_cube_is_good() {
    let mut mesh = perfect_cube();
    rebuild_topology_from_scratch(&mut mesh);
    let record = DiagnosticRecord::evaluate(&mesh);
    assert_eq!(record.num_face, 12);
    assert_eq!(record.num_vertices, 8);
    assert!(record.is_watertight);
    assert!(record.is_coherently_oriented);
    assert!(record.is_positive_volume);
    assert_eq!(record.num_shells, 1);
    assert_eq!(record.num_holes, 0);
    assert!((record.area - 24.0).abs() < 1e-3);
    assert!((record.signed_volume - 8.0).abs() < 1e-3);
    assert!(record.is_good_mesh);
}

#[test]
fn two_disjoint_cubes_have_two_shells() {
    let mut mesh = two_disjoint_cubes();
    rebuild_topology_from_scratch(&mut mesh);
    let record = DiagnosticRecord::evaluate(&mesh);
    assert_eq!(record.num_shells, 2);
    assert!((record.area - 48.0).abs() < 1e-2);
    assert!((record.signed_volume - 16.0).abs() < 1e-2);
}

#[test]
fn cube_with_hole_repairs_cleanly() {
    let mut mesh = cube_missing_one_face();
    rebuild_topology_from_scratch(&mut mesh);
    let pre = DiagnosticRecord::evaluate(&mesh);
    assert!(!pre.is_watertight);
    assert_eq!(pre.num_holes, 1);

    let (repair_record, post) = repair(&mut mesh, &pre, RepairPolicy::default(), None);
    assert_eq!(repair_record.num_hole_fix, 1);
    assert!(post.is_watertight);
    assert!(repair_record.is_good_repair);
}

#[test]
fn inverted_cube_repairs_by_flipping() {
    let mut mesh = cube_inverted();
    let pre = DiagnosticRecord::evaluate(&mesh);
    assert!(pre.is_coherently_oriented);
    assert!(!pre.is_positive_volume);

    let (repair_record, post) = repair(&mut mesh, &pre, RepairPolicy::default(), None);
    assert!(repair_record.does_flip_normal_outside);
    assert!(post.is_positive_volume);
}

#[test]
fn cube_with_misoriented_face_repairs_by_reorienting() {
    let mut mesh = cube_one_misoriented_face();
    rebuild_topology_from_scratch(&mut mesh);
    let pre = DiagnosticRecord::evaluate(&mesh);
    assert!(!pre.is_coherently_oriented);

    let (repair_record, post) = repair(&mut mesh, &pre, RepairPolicy::default(), None);
    assert!(repair_record.does_make_coherent_orient);
    assert!(post.is_coherently_oriented);
}

#[test]
fn three_faces_sharing_an_edge_is_non_manifold_and_repairs() {
    let mut mesh = three_faces_sharing_one_edge();
    rebuild_topology_from_scratch(&mut mesh);
    let pre = DiagnosticRecord::evaluate(&mesh);
    assert!(pre.num_non_manifold_edges >= 1);
    assert_eq!(pre.num_holes, -1);

    let (repair_record, post) = repair(&mut mesh, &pre, RepairPolicy::default(), None);
    assert_eq!(repair_record.num_rm_non_manif_faces, 3);
    assert!(post.is_watertight);
}

#[test]
fn empty_mesh_is_not_a_good_mesh_and_does_not_crash() {
    let mesh = Mesh::new();
    let record = DiagnosticRecord::evaluate(&mesh);
    assert!(!record.is_good_mesh);
    assert_eq!(record.num_face, 0);
}

#[test]
fn isolated_triangle_has_one_shell_one_hole_not_watertight() {
    use mesh_core::base::Point3;
    let mut mesh = Mesh::from_positions_and_indices(
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
        vec![0, 1, 2],
    );
    rebuild_topology_from_scratch(&mut mesh);
    let record = DiagnosticRecord::evaluate(&mesh);
    assert_eq!(record.num_shells, 1);
    assert_eq!(record.num_holes, 1);
    assert!(!record.is_watertight);
}

#[test]
fn hole_over_the_cap_is_not_filled() {
    let mut mesh = cube_missing_one_face();
    rebuild_topology_from_scratch(&mut mesh);
    let pre = DiagnosticRecord::evaluate(&mesh);
    let tiny_cap = RepairPolicy { max_hole_loop_size: 2, ..RepairPolicy::default() };
    let (repair_record, _post) = repair(&mut mesh, &pre, tiny_cap, None);
    assert_eq!(repair_record.num_hole_fix, 0);
}

#[test]
fn surface_area_is_never_negative() {
    for mesh in [perfect_cube(), cube_inverted(), cube_one_misoriented_face(), three_faces_sharing_one_edge()] {
        assert!(predicates::surface_area(&mesh) >= 0.0);
    }
}
