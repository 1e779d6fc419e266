//! Property-based checks for the universal invariants in the testable
//! properties list: surface area is never negative, and cleaning is
//! idempotent on its own output.

use mesh_core::base::Point3;
use mesh_core::cleaner::{merge_duplicate_vertices, remove_duplicate_faces};
use mesh_core::mesh::Mesh;
use mesh_core::predicates::surface_area;
use proptest::prelude::*;

fn arbitrary_triangle_soup(max_triangles: usize) -> impl Strategy<Value = Mesh> {
    let coord = -10.0f32..10.0f32;
    prop::collection::vec((coord.clone(), coord.clone(), coord), 3..(max_triangles.max(3) * 3))
        .prop_map(|coords| {
            let positions: Vec<Point3> = coords.into_iter().map(|(x, y, z)| Point3::new(x, y, z)).collect();
            let triangle_count = positions.len() / 3;
            let indices: Vec<u32> = (0..triangle_count * 3).map(|i| i as u32).collect();
            Mesh::from_positions_and_indices(positions, indices)
        })
}

proptest! {
    #[test]
    fn surface_area_is_never_negative(mesh in arbitrary_triangle_soup(12)) {
        prop_assert!(surface_area(&mesh) >= 0.0);
    }

    #[test]
    fn merge_then_dedup_is_idempotent(mesh in arbitrary_triangle_soup(12)) {
        let mut mesh = mesh;
        merge_duplicate_vertices(&mut mesh, false);
        remove_duplicate_faces(&mut mesh);
        let merged_again = merge_duplicate_vertices(&mut mesh, false);
        let deduped_again = remove_duplicate_faces(&mut mesh);
        prop_assert_eq!(merged_again, 0);
        prop_assert_eq!(deduped_again, 0);
    }
}
