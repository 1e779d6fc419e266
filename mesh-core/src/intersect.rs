//! Triangle-triangle intersection test used by the self-intersection
//! predicate and the hole filler's ear veto.
//!
//! A separating-axis test: two triangles are disjoint iff some axis
//! among the two face normals and the nine pairwise edge-cross
//! products separates their projected intervals. Coincident or
//! near-degenerate axes (parallel edges) are skipped rather than
//! treated as separating, per the usual SAT caveat for triangles.

use crate::base::{Point3, Vector3, TOLERANCE};
use cgmath::InnerSpace;

fn dot_point(axis: Vector3, point: Point3) -> f32 {
    axis.x * point.x + axis.y * point.y + axis.z * point.z
}

fn project(triangle: &[Point3; 3], axis: Vector3) -> (f32, f32) {
    let mut min = dot_point(axis, triangle[0]);
    let mut max = min;
    for p in &triangle[1..] {
        let d = dot_point(axis, *p);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

fn overlaps_on_axis(a: &[Point3; 3], b: &[Point3; 3], axis: Vector3) -> bool {
    if axis.dot(axis) < TOLERANCE * TOLERANCE {
        // Degenerate axis (parallel edges): not a valid separator.
        return true;
    }
    let (amin, amax) = project(a, axis);
    let (bmin, bmax) = project(b, axis);
    amax >= bmin - TOLERANCE && bmax >= amin - TOLERANCE
}

/// True iff triangles `a` and `b` overlap in 3-space (including
/// touching). Callers are expected to have already excluded pairs
/// sharing one or two vertices, per the predicate suite's contract.
pub fn triangles_intersect(a: [Point3; 3], b: [Point3; 3]) -> bool {
    let edges_a = [a[1] - a[0], a[2] - a[1], a[0] - a[2]];
    let edges_b = [b[1] - b[0], b[2] - b[1], b[0] - b[2]];
    let normal_a = edges_a[0].cross(edges_a[1]);
    let normal_b = edges_b[0].cross(edges_b[1]);

    let mut axes = vec![normal_a, normal_b];
    for ea in &edges_a {
        for eb in &edges_b {
            axes.push(ea.cross(*eb));
        }
    }

    axes.iter().all(|&axis| overlaps_on_axis(&a, &b, axis))
}

/// True iff triangles `a` and `b`, given as vertex index triples,
/// share one or two vertex indices (degenerate shared-edge/shared-
/// vertex adjacency, not a genuine self-intersection per the
/// predicate suite's contract).
pub fn shares_a_vertex(a: [u32; 3], b: [u32; 3]) -> bool {
    a.iter().any(|v| b.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_triangles_do_not_intersect() {
        let a = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        let b = [Point3::new(10.0, 10.0, 10.0), Point3::new(11.0, 10.0, 10.0), Point3::new(10.0, 11.0, 10.0)];
        assert!(!triangles_intersect(a, b));
    }

    #[test]
    fn crossing_triangles_intersect() {
        let a = [Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 0.0, -1.0), Point3::new(0.0, 0.0, 1.0)];
        let b = [Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, 2.0)];
        assert!(triangles_intersect(a, b));
    }

    #[test]
    fn coplanar_overlapping_triangles_intersect() {
        let a = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)];
        let b = [Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0)];
        assert!(triangles_intersect(a, b));
    }

    #[test]
    fn shares_a_vertex_detects_overlap() {
        assert!(shares_a_vertex([0, 1, 2], [2, 5, 6]));
        assert!(!shares_a_vertex([0, 1, 2], [3, 5, 6]));
    }
}
