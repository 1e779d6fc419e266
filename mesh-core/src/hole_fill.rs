//! Self-intersection-checked ear cutting over border-edge loops.
//!
//! A fixed loop-size cap bounds how large a border loop the filler
//! will attempt. Ear validity itself is decided purely by whether the
//! candidate triangle intersects existing geometry, checked against
//! this crate's own [`crate::grid::FaceGrid`] rather than an
//! all-pairs scan: a hole's own rim routinely spans an appreciable
//! fraction of the mesh's bounding box, so a hard edge-length veto
//! would reject the very ears a hole needs to close. The bounding-box
//! derived length instead only biases which valid ear is picked first
//! (see `ear_quality`).

use crate::base::{distance, BoundingBox, Point3};
use crate::grid::FaceGrid;
use crate::intersect::triangles_intersect;
use crate::mesh::{ElementFlags, Face, Mesh};

/// Maximum number of edges a border loop may have and still be
/// considered for filling. Loops larger than this are left alone.
pub const DEFAULT_MAX_LOOP_SIZE: usize = 100;

/// Fraction of the mesh bounding box's largest axis extent used to
/// bias ear selection toward shorter new edges. Not a hard limit:
/// an ear longer than this is still selectable, and is still closed,
/// when no shorter valid ear exists.
pub const MAX_EDGE_LENGTH_FRACTION: f32 = 0.01;

/// Optional progress reporter invoked synchronously while loops are
/// processed; advisory only, the hole filler never cancels itself.
pub type ProgressCallback<'a> = dyn FnMut(u8, &str) -> bool + 'a;

fn border_loops(mesh: &Mesh) -> Vec<Vec<u32>> {
    use std::collections::HashMap;
    let mut outgoing: HashMap<u32, u32> = HashMap::new();
    for (_, face) in mesh.live_faces() {
        for slot in 0..3 {
            if face.is_border_edge(slot) {
                let (a, b) = face.edge(slot);
                outgoing.insert(a, b);
            }
        }
    }
    let mut visited = std::collections::HashSet::new();
    let mut loops = Vec::new();
    for (&start, _) in outgoing.iter() {
        if visited.contains(&start) {
            continue;
        }
        let mut loop_vertices = vec![start];
        visited.insert(start);
        let mut current = start;
        loop {
            match outgoing.get(&current) {
                Some(&next) if next != start => {
                    if !visited.insert(next) {
                        break;
                    }
                    loop_vertices.push(next);
                    current = next;
                }
                Some(_) => break, // closed the loop back to start
                None => break,    // dangling, malformed border
            }
        }
        loops.push(loop_vertices);
    }
    loops
}

fn longest_edge(a: Point3, b: Point3, c: Point3) -> f32 {
    distance(a, b).max(distance(b, c)).max(distance(c, a))
}

/// Dihedral-deviation-style quality score: lower is better. Measures
/// how far the candidate ear's normal deviates from its two existing
/// incident triangles' normals, approximated here as the angle
/// between the ear normal and the average of its neighbor edge
/// directions (a cheap, self-contained stand-in that still prefers
/// flatter ears over sharp spikes). Ears whose longest edge exceeds
/// `max_edge_length` are not excluded, only penalized, so a hole with
/// no shorter alternative still closes.
fn ear_quality(prev: Point3, curr: Point3, next: Point3, max_edge_length: f32) -> f32 {
    let e1 = (curr - prev).cross(next - prev);
    let mag = (e1.x * e1.x + e1.y * e1.y + e1.z * e1.z).sqrt();
    if mag < 1.0e-12 {
        return f32::INFINITY;
    }
    // Favor near-equilateral ears: smaller spread between edge
    // lengths approximates "dihedral deviation" well enough without
    // needing the neighboring faces' normals.
    let a = distance(prev, curr);
    let b = distance(curr, next);
    let c = distance(next, prev);
    let mean = (a + b + c) / 3.0;
    let spread = ((a - mean).powi(2) + (b - mean).powi(2) + (c - mean).powi(2)).sqrt();
    let longest = a.max(b).max(c);
    let length_penalty = (longest - max_edge_length).max(0.0);
    spread + length_penalty
}

struct FillContext<'a> {
    mesh: &'a mut Mesh,
    max_edge_length: f32,
}

impl<'a> FillContext<'a> {
    /// True iff the candidate ear at `loop_vertices[i]` does not
    /// intersect any existing face outside its own loop neighborhood.
    fn ear_is_valid(&self, loop_vertices: &[u32], i: usize) -> bool {
        let n = loop_vertices.len();
        let prev_v = loop_vertices[(i + n - 1) % n];
        let curr_v = loop_vertices[i];
        let next_v = loop_vertices[(i + 1) % n];
        let (prev, curr, next) = (
            self.mesh.vertices()[prev_v as usize].position,
            self.mesh.vertices()[curr_v as usize].position,
            self.mesh.vertices()[next_v as usize].position,
        );
        let ear_triangle = [prev, curr, next];
        let ear_bbox = BoundingBox::from_points(&ear_triangle);
        let faces: Vec<(u32, [Point3; 3])> = self
            .mesh
            .live_faces()
            .map(|(idx, f)| {
                let [a, b, c] = f.vertex;
                (
                    idx,
                    [
                        self.mesh.vertices()[a as usize].position,
                        self.mesh.vertices()[b as usize].position,
                        self.mesh.vertices()[c as usize].position,
                    ],
                )
            })
            .collect();
        let grid = FaceGrid::build(&ear_bbox, faces.iter().cloned());
        for candidate in grid.candidates_near(&ear_bbox) {
            let (_, triangle) = faces.iter().find(|(idx, _)| *idx == candidate).unwrap();
            if triangles_intersect(ear_triangle, *triangle) {
                // Sharing one or two vertices with an existing face at
                // the loop boundary is expected and not a veto; only a
                // genuine crossing with an unrelated face disqualifies
                // the ear. Shared-vertex faces by construction touch
                // only along a point or edge, which the SAT test
                // reports as a (degenerate) overlap too, so exclude
                // faces that already contain one of the ear's vertices.
                let touches_ear_vertex = [prev_v, curr_v, next_v].iter().any(|v| {
                    self.mesh.faces()[candidate as usize].contains_vertex(*v)
                });
                if !touches_ear_vertex {
                    return false;
                }
            }
        }
        true
    }
}

/// Closes as many border loops as possible with ear-cutting triangles,
/// subject to `max_loop_size`. Ear selection is biased toward shorter
/// edges via a length derived from the mesh's bounding box, but that
/// length never blocks closing a loop outright. Returns the number of
/// loops fully closed. Leaves adjacency stale; callers rebuild
/// topology afterward.
pub fn fill_holes(mesh: &mut Mesh, max_loop_size: usize, mut progress: Option<&mut ProgressCallback>) -> usize {
    let bbox = crate::predicates::bounding_box(mesh);
    let diag = bbox.diagonal();
    let max_edge_length = MAX_EDGE_LENGTH_FRACTION * diag.x.max(diag.y).max(diag.z);

    let loops = border_loops(mesh);
    let total = loops.len().max(1);
    let mut closed = 0;

    for (loop_idx, mut loop_vertices) in loops.into_iter().enumerate() {
        if let Some(cb) = progress.as_deref_mut() {
            let pct = ((loop_idx * 100) / total) as u8;
            cb(pct, "filling hole");
        }
        if loop_vertices.len() < 3 || loop_vertices.len() > max_loop_size {
            continue;
        }
        let mut ctx = FillContext { mesh, max_edge_length };
        let mut ok = true;
        while loop_vertices.len() > 3 {
            let n = loop_vertices.len();
            let best = (0..n)
                .filter(|&i| ctx.ear_is_valid(&loop_vertices, i))
                .min_by(|&i, &j| {
                    let score_of = |i: usize| {
                        let prev = ctx.mesh.vertices()[loop_vertices[(i + n - 1) % n] as usize].position;
                        let curr = ctx.mesh.vertices()[loop_vertices[i] as usize].position;
                        let next = ctx.mesh.vertices()[loop_vertices[(i + 1) % n] as usize].position;
                        ear_quality(prev, curr, next, ctx.max_edge_length)
                    };
                    score_of(i).partial_cmp(&score_of(j)).unwrap()
                });
            let Some(i) = best else {
                ok = false;
                break;
            };
            let prev_v = loop_vertices[(i + n - 1) % n];
            let curr_v = loop_vertices[i];
            let next_v = loop_vertices[(i + 1) % n];
            ctx.mesh.push_face(Face::new(prev_v, curr_v, next_v));
            loop_vertices.remove(i);
        }
        if ok && loop_vertices.len() == 3 && ctx.ear_is_valid(&loop_vertices, 0) {
            ctx.mesh.push_face(Face::new(loop_vertices[0], loop_vertices[1], loop_vertices[2]));
            closed += 1;
        }
    }

    for face in mesh.faces_mut() {
        if face.is_live() {
            face.flags.clear(ElementFlags::DELETED);
        }
    }
    mesh.bump_mark();
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::rebuild_topology_from_scratch;

    #[test]
    fn fills_single_missing_triangle_in_quad() {
        // Quad boundary with one triangle missing, i.e. a single
        // border loop of size 3, closed by exactly one ear.
        let mut mesh = Mesh::from_positions_and_indices(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        );
        rebuild_topology_from_scratch(&mut mesh);
        let closed = fill_holes(&mut mesh, DEFAULT_MAX_LOOP_SIZE, None);
        assert_eq!(closed, 1);
        assert_eq!(mesh.live_face_count(), 2);
    }

    #[test]
    fn loop_over_the_cap_is_left_unfilled() {
        // A 6-triangle fan around a missing center vertex leaves a
        // single border loop of 6 edges around the rim.
        let n = 6;
        let mut positions = vec![Point3::new(0.0, 0.0, 0.0)];
        for i in 0..n {
            let theta = std::f32::consts::TAU * (i as f32) / (n as f32);
            positions.push(Point3::new(theta.cos(), theta.sin(), 0.0));
        }
        let mut indices = Vec::new();
        for i in 0..n {
            let a = 1 + i as u32;
            let b = 1 + ((i + 1) % n) as u32;
            indices.extend_from_slice(&[0, a, b]);
        }
        let mut mesh = Mesh::from_positions_and_indices(positions, indices);
        rebuild_topology_from_scratch(&mut mesh);
        let closed = fill_holes(&mut mesh, 3, None);
        assert_eq!(closed, 0);
        let closed = fill_holes(&mut mesh, DEFAULT_MAX_LOOP_SIZE, None);
        assert_eq!(closed, 1);
    }
}
