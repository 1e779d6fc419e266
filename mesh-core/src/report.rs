//! The flat JSON report record, matching the external report schema
//! key-for-key: pre-repair keys carry no prefix, post-repair values
//! (when a repair ran) repeat every pre-repair key with an `r_`
//! prefix plus the repair-specific fields.

use crate::base::BoundingBox;
use crate::predicates;
use crate::repair::RepairRecord;
use serde::Serialize;
use std::collections::BTreeMap;

/// Schema version of the pre-repair record, a literal per the wire
/// contract rather than a crate version.
pub const NUM_VERSION: i32 = 4;
/// Schema version of the repair-record extension, a literal per the
/// wire contract.
pub const REPAIR_VERSION: i32 = 1;

/// The full diagnostic snapshot of a mesh at one point in time.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticRecord {
    /// live face count
    pub num_face: usize,
    /// live vertex count
    pub num_vertices: usize,
    /// `degenerate_face_count` predicate
    pub num_degenerated_faces: usize,
    /// `duplicate_face_count` predicate
    pub num_duplicated_faces: usize,
    /// `is_watertight` predicate
    pub is_watertight: bool,
    /// `is_coherently_oriented` predicate
    pub is_coherently_oriented: bool,
    /// `is_positive_volume` predicate
    pub is_positive_volume: bool,
    /// `self_intersection_count` predicate
    pub num_intersecting_faces: usize,
    /// `shell_count` predicate
    pub num_shells: usize,
    /// `non_manifold_edge_count` predicate
    pub num_non_manifold_edges: usize,
    /// `hole_count` predicate; `-1` when undefined
    pub num_holes: i32,
    /// watertight AND coherently oriented AND positive volume
    pub is_good_mesh: bool,
    /// live-vertex bounding box; zeroed on an empty mesh
    pub bbox: BoundingBox,
    /// `surface_area` predicate
    pub area: f32,
    /// `signed_volume` predicate
    pub signed_volume: f32,
}

impl DiagnosticRecord {
    /// Runs the full predicate suite against `mesh` and assembles the
    /// diagnostic record. Requires current face-face adjacency.
    pub fn evaluate(mesh: &crate::mesh::Mesh) -> Self {
        let bbox = predicates::bounding_box(mesh);
        let is_watertight = predicates::is_watertight(mesh);
        let is_coherently_oriented = predicates::is_coherently_oriented(mesh);
        let signed_volume = predicates::signed_volume(mesh);
        let is_positive_volume = signed_volume > 0.0;
        DiagnosticRecord {
            num_face: mesh.live_face_count(),
            num_vertices: mesh.live_vertex_count(),
            num_degenerated_faces: predicates::degenerate_face_count(mesh),
            num_duplicated_faces: predicates::duplicate_face_count(mesh),
            is_watertight,
            is_coherently_oriented,
            is_positive_volume,
            num_intersecting_faces: predicates::self_intersection_count(mesh),
            num_shells: predicates::shell_count(mesh),
            num_non_manifold_edges: predicates::non_manifold_edge_count(mesh),
            num_holes: predicates::hole_count(mesh),
            is_good_mesh: is_watertight && is_coherently_oriented && is_positive_volume,
            bbox,
            area: predicates::surface_area(mesh),
            signed_volume,
        }
    }

    fn insert_into(&self, map: &mut BTreeMap<String, serde_json::Value>, prefix: &str) {
        let key = |name: &str| format!("{prefix}{name}");
        map.insert(key("num_face"), self.num_face.into());
        map.insert(key("num_vertices"), self.num_vertices.into());
        map.insert(key("num_degenerated_faces_removed"), self.num_degenerated_faces.into());
        map.insert(key("num_duplicated_faces_removed"), self.num_duplicated_faces.into());
        map.insert(key("is_watertight"), self.is_watertight.into());
        map.insert(key("is_coherently_oriented"), self.is_coherently_oriented.into());
        map.insert(key("is_positive_volume"), self.is_positive_volume.into());
        map.insert(key("num_intersecting_faces"), self.num_intersecting_faces.into());
        map.insert(key("num_shells"), self.num_shells.into());
        map.insert(key("num_non_manifold_edges"), self.num_non_manifold_edges.into());
        map.insert(key("num_holes"), self.num_holes.into());
        map.insert(key("is_good_mesh"), self.is_good_mesh.into());
        let (min, max) = if self.bbox.is_empty() {
            (crate::base::zero_point(), crate::base::zero_point())
        } else {
            (self.bbox.min(), self.bbox.max())
        };
        map.insert(key("min_x"), (min.x as f64).into());
        map.insert(key("max_x"), (max.x as f64).into());
        map.insert(key("min_y"), (min.y as f64).into());
        map.insert(key("max_y"), (max.y as f64).into());
        map.insert(key("min_z"), (min.z as f64).into());
        map.insert(key("max_z"), (max.z as f64).into());
        map.insert(key("area"), (self.area as f64).into());
        map.insert(key("volume"), (self.signed_volume as f64).into());
    }
}

/// The full report: the pre-repair record, and, if the repair driver
/// ran, the post-repair record plus the driver's own outcome fields.
#[derive(Clone, Copy, Debug)]
pub struct Report {
    /// diagnostic snapshot before any repair attempt
    pub pre: DiagnosticRecord,
    /// post-repair snapshot and driver outcome, if repair ran
    pub repaired: Option<(RepairRecord, DiagnosticRecord)>,
}

impl Serialize for Report {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = BTreeMap::new();
        map.insert("num_version".to_string(), NUM_VERSION.into());
        self.pre.insert_into(&mut map, "");
        if let Some((repair_record, post)) = &self.repaired {
            post.insert_into(&mut map, "r_");
            map.insert("repair_version".to_string(), REPAIR_VERSION.into());
            map.insert("does_make_coherent_orient".to_string(), repair_record.does_make_coherent_orient.into());
            map.insert("does_flip_normal_outside".to_string(), repair_record.does_flip_normal_outside.into());
            map.insert("num_rm_non_manif_faces".to_string(), repair_record.num_rm_non_manif_faces.into());
            map.insert("num_hole_fix".to_string(), repair_record.num_hole_fix.into());
            map.insert("is_good_repair".to_string(), repair_record.is_good_repair.into());
        }
        map.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Point3;
    use crate::mesh::Mesh;
    use crate::topology::rebuild_topology_from_scratch;

    #[test]
    fn perfect_cube_report_matches_known_values() {
        let p = vec![
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ];
        let idx = vec![
            0, 3, 2, 0, 2, 1, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 1, 2, 6, 1, 6, 5, 2, 3, 7, 2, 7, 6, 3, 0, 4, 3, 4, 7,
        ];
        let mut mesh = Mesh::from_positions_and_indices(p, idx);
        rebuild_topology_from_scratch(&mut mesh);
        let pre = DiagnosticRecord::evaluate(&mesh);
        let report = Report { pre, repaired: None };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["num_face"], 12);
        assert_eq!(value["num_vertices"], 8);
        assert_eq!(value["is_good_mesh"], true);
        assert_eq!(value["area"], 24.0);
        assert!(!value.as_object().unwrap().contains_key("r_num_face"));
    }
}
