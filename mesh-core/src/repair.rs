//! The repair driver: a fixed ordered sequence of cleaner and hole-
//! filler steps gated on the current diagnostic record, re-evaluated
//! after each step: non-manifold removal, then hole filling, then
//! coherent reorientation, then a volume-sign flip, each step
//! re-running only the predicates it could have affected.

use crate::cleaner;
use crate::hole_fill::{self, ProgressCallback};
use crate::mesh::Mesh;
use crate::report::DiagnosticRecord;
use crate::topology::rebuild_topology_from_scratch;

/// Tunable knobs for the repair driver, kept explicit rather than
/// hardcoded so callers can override them.
#[derive(Clone, Copy, Debug)]
pub struct RepairPolicy {
    /// Maximum border-loop size the hole filler will attempt.
    pub max_hole_loop_size: usize,
    /// Whether [`RepairRecord::is_good_repair`] additionally requires
    /// zero holes after repair; defaulted off (see DESIGN.md).
    pub require_no_holes_for_good_repair: bool,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        RepairPolicy {
            max_hole_loop_size: hole_fill::DEFAULT_MAX_LOOP_SIZE,
            require_no_holes_for_good_repair: false,
        }
    }
}

/// Which steps fired and how many elements each affected.
#[derive(Clone, Copy, Debug, Default)]
pub struct RepairRecord {
    /// `orient_coherently` ran and completed without contradiction.
    pub does_make_coherent_orient: bool,
    /// `flip_mesh` ran to restore positive volume.
    pub does_flip_normal_outside: bool,
    /// Faces removed by `remove_non_manifold_faces`.
    pub num_rm_non_manif_faces: usize,
    /// Border loops successfully closed by the hole filler.
    pub num_hole_fix: usize,
    /// Post-repair success per [`RepairPolicy`] and §4.5's definition.
    pub is_good_repair: bool,
}

fn is_good_mesh(record: &DiagnosticRecord) -> bool {
    record.is_watertight && record.is_coherently_oriented && record.is_positive_volume
}

/// Runs the repair driver over `mesh`, given its pre-repair
/// diagnostic record. Returns the repair record and the post-repair
/// diagnostic record. Mesh adjacency is left current on return.
pub fn repair(
    mesh: &mut Mesh,
    pre: &DiagnosticRecord,
    policy: RepairPolicy,
    mut progress: Option<&mut ProgressCallback>,
) -> (RepairRecord, DiagnosticRecord) {
    let mut record = RepairRecord::default();
    let mut current = DiagnosticRecord::evaluate(mesh);

    if !current.is_watertight && current.num_non_manifold_edges > 0 {
        record.num_rm_non_manif_faces = cleaner::remove_non_manifold_faces(mesh);
        rebuild_topology_from_scratch(mesh);
        current = DiagnosticRecord::evaluate(mesh);
    }

    if !current.is_watertight {
        let closed = hole_fill::fill_holes(mesh, policy.max_hole_loop_size, progress.as_deref_mut());
        record.num_hole_fix = closed;
        if closed > 0 {
            cleaner::merge_duplicate_vertices(mesh, true);
        }
        rebuild_topology_from_scratch(mesh);
        current = DiagnosticRecord::evaluate(mesh);
    }

    if current.is_watertight && !current.is_coherently_oriented {
        let outcome = cleaner::orient_coherently(mesh);
        record.does_make_coherent_orient = outcome.oriented && outcome.orientable;
        rebuild_topology_from_scratch(mesh);
        current = DiagnosticRecord::evaluate(mesh);
    }

    if current.is_watertight && current.is_coherently_oriented && current.signed_volume <= 0.0 {
        cleaner::flip_mesh(mesh);
        record.does_flip_normal_outside = true;
        current = DiagnosticRecord::evaluate(mesh);
    }

    let good_mesh = is_good_mesh(&current);
    let shells_match = current.num_shells == pre.num_shells;
    let intersections_match = current.num_intersecting_faces == pre.num_intersecting_faces;
    let holes_ok = !policy.require_no_holes_for_good_repair || current.num_holes == 0;
    record.is_good_repair = good_mesh && shells_match && intersections_match && holes_ok;

    (record, current)
}
