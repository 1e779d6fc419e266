//! The indexed triangle mesh store: vertices, faces, flags, and the
//! mark epoch that invalidates cached topology.
//!
//! Face-face "pointers" are plain `u32` indices into `Mesh::faces`
//! with [`BORDER`] as the sentinel for "no neighbor on this edge" —
//! an arena of structs rather than a graph of owned nodes, so the
//! mesh can be cloned, serialized, and mutated in place without
//! fighting the borrow checker over cyclic references (Design Notes).

use crate::base::{Point3, Vector3};
use cgmath::InnerSpace;
use serde::{Deserialize, Serialize};

/// Sentinel neighbor/attribute value meaning "no such element" — a
/// border edge has no neighbor face, for instance.
pub const BORDER: u32 = u32::MAX;

/// Shared bit layout for [`Vertex`] and [`Face`] flag words.
///
/// Vertex and face flags share one representation because nothing in
/// this core distinguishes them structurally — only by which bits a
/// given algorithm reads or writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementFlags(u16);

impl ElementFlags {
    /// Element has been logically removed; still occupies its slot.
    pub const DELETED: u16 = 1 << 0;
    /// Vertex is an endpoint of a border edge, or face has a border edge.
    pub const BORDER: u16 = 1 << 1;
    /// Scratch bit for graph walks (flood fill, hole-loop traversal).
    pub const VISITED: u16 = 1 << 2;
    /// Scratch bit for interactive selection; unused by the core
    /// algorithms but preserved for callers layered on top.
    pub const SELECTED: u16 = 1 << 3;
    /// First of four bits callers may repurpose freely.
    pub const USER_BIT_0: u16 = 1 << 4;

    /// An empty flag word.
    pub fn empty() -> Self { ElementFlags(0) }

    /// True iff every bit in `mask` is set.
    pub fn has(&self, mask: u16) -> bool { self.0 & mask == mask }

    /// Sets every bit in `mask`.
    pub fn set(&mut self, mask: u16) { self.0 |= mask; }

    /// Clears every bit in `mask`.
    pub fn clear(&mut self, mask: u16) { self.0 &= !mask; }
}

/// A vertex: position, normal, flags, and the mark epoch at which it
/// was last structurally touched.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Vertex {
    /// position in model space
    pub position: Point3,
    /// vertex normal; zero until an algorithm computes one
    pub normal: Vector3,
    /// deleted/border/visited/selected/user bits
    pub flags: ElementFlags,
}

impl Vertex {
    /// A new vertex at `position` with a zero normal and no flags set.
    pub fn new(position: Point3) -> Self {
        Vertex {
            position,
            normal: Vector3::new(0.0, 0.0, 0.0),
            flags: ElementFlags::empty(),
        }
    }

    /// True iff this vertex has not been flagged deleted.
    pub fn is_live(&self) -> bool { !self.flags.has(ElementFlags::DELETED) }
}

/// A triangular face: three vertex indices, three face-neighbor
/// indices (one per opposite edge), per-edge border bits, a cached
/// normal, and flags.
///
/// `neighbor[k]` is the face sharing the edge opposite `vertex[k]`
/// (i.e. the edge `(vertex[(k+1)%3], vertex[(k+2)%3])`), or [`BORDER`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Face {
    /// vertex indices, in winding order
    pub vertex: [u32; 3],
    /// face-neighbor indices, or [`BORDER`]
    pub neighbor: [u32; 3],
    /// per-edge border bit, indexed the same way as `neighbor`
    border_edge: [bool; 3],
    /// cached face normal; valid only after an explicit recompute
    pub normal: Vector3,
    /// deleted/border/visited/selected/user bits
    pub flags: ElementFlags,
}

impl Face {
    /// A new face over the given vertex indices with no adjacency yet.
    pub fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Face {
            vertex: [v0, v1, v2],
            neighbor: [BORDER; 3],
            border_edge: [true; 3],
            normal: Vector3::new(0.0, 0.0, 0.0),
            flags: ElementFlags::empty(),
        }
    }

    /// True iff this face has not been flagged deleted.
    pub fn is_live(&self) -> bool { !self.flags.has(ElementFlags::DELETED) }

    /// The directed edge opposite `vertex[k]`, i.e. edge slot `k`.
    pub fn edge(&self, k: usize) -> (u32, u32) {
        (self.vertex[(k + 1) % 3], self.vertex[(k + 2) % 3])
    }

    /// True iff edge slot `k` is a border edge (no live neighbor).
    pub fn is_border_edge(&self, k: usize) -> bool { self.border_edge[k] }

    /// Sets the border bit for edge slot `k`.
    pub fn set_border_edge(&mut self, k: usize, border: bool) { self.border_edge[k] = border; }

    /// True iff `vertex_idx` is one of this face's three corners.
    pub fn contains_vertex(&self, vertex_idx: u32) -> bool { self.vertex.contains(&vertex_idx) }

    /// Index of `vertex_idx` within `vertex`, if present.
    pub fn local_index(&self, vertex_idx: u32) -> Option<usize> {
        self.vertex.iter().position(|&v| v == vertex_idx)
    }
}

/// An indexed triangle mesh: vertex/face arenas plus the mark epoch
/// used to invalidate cached topology (the face-face adjacency built
/// by [`crate::topology`]).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    mark_epoch: u64,
}

impl Mesh {
    /// An empty mesh.
    pub fn new() -> Self { Self::default() }

    /// Builds a mesh from raw positions and a flat triangle index
    /// list (`indices.len()` must be a multiple of 3). This is the
    /// common landing point for all I/O adapters.
    pub fn from_positions_and_indices(positions: Vec<Point3>, indices: Vec<u32>) -> Self {
        let vertices = positions.into_iter().map(Vertex::new).collect();
        let faces = indices
            .chunks_exact(3)
            .map(|c| Face::new(c[0], c[1], c[2]))
            .collect();
        Mesh {
            vertices,
            faces,
            mark_epoch: 0,
        }
    }

    /// All vertex slots, including deleted ones.
    pub fn vertices(&self) -> &[Vertex] { &self.vertices }
    /// All vertex slots, including deleted ones, mutably.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] { &mut self.vertices }
    /// All face slots, including deleted ones.
    pub fn faces(&self) -> &[Face] { &self.faces }
    /// All face slots, including deleted ones, mutably.
    pub fn faces_mut(&mut self) -> &mut [Face] { &mut self.faces }

    /// Appends a vertex, returning its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    /// Appends a face, returning its index.
    pub fn push_face(&mut self, face: Face) -> u32 {
        self.faces.push(face);
        (self.faces.len() - 1) as u32
    }

    /// Number of non-deleted vertices.
    pub fn live_vertex_count(&self) -> usize { self.vertices.iter().filter(|v| v.is_live()).count() }

    /// Number of non-deleted faces.
    pub fn live_face_count(&self) -> usize { self.faces.iter().filter(|f| f.is_live()).count() }

    /// Iterator over `(index, face)` for non-deleted faces.
    pub fn live_faces(&self) -> impl Iterator<Item = (u32, &Face)> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_live())
            .map(|(i, f)| (i as u32, f))
    }

    /// Iterator over `(index, vertex)` for non-deleted vertices.
    pub fn live_vertices(&self) -> impl Iterator<Item = (u32, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_live())
            .map(|(i, v)| (i as u32, v))
    }

    /// The current mark epoch. Any cached topology computed at an
    /// older epoch is stale and must be rebuilt before use.
    pub fn mark_epoch(&self) -> u64 { self.mark_epoch }

    /// Bumps the mark epoch. Every structural mutator (cleaner
    /// operation, hole fill, topology rebuild) calls this exactly
    /// once on completion.
    pub fn bump_mark(&mut self) { self.mark_epoch += 1; }

    /// Physically removes deleted vertices and faces, remapping
    /// surviving face vertex indices. Invalidates any index a caller
    /// may be holding onto (Lifecycle, spec §3) and bumps the mark
    /// epoch.
    pub fn compact(&mut self) {
        let mut old_to_new = vec![BORDER; self.vertices.len()];
        let mut new_vertices = Vec::with_capacity(self.vertices.len());
        for (old_idx, vertex) in self.vertices.iter().enumerate() {
            if vertex.is_live() {
                old_to_new[old_idx] = new_vertices.len() as u32;
                new_vertices.push(*vertex);
            }
        }
        let new_faces: Vec<Face> = self
            .faces
            .iter()
            .filter(|f| f.is_live())
            .map(|f| {
                let mut nf = *f;
                nf.vertex = [
                    old_to_new[f.vertex[0] as usize],
                    old_to_new[f.vertex[1] as usize],
                    old_to_new[f.vertex[2] as usize],
                ];
                nf.neighbor = [BORDER; 3];
                nf
            })
            .collect();
        self.vertices = new_vertices;
        self.faces = new_faces;
        self.bump_mark();
    }

    /// Computes the triangle's geometric area (half the cross-product
    /// magnitude), `0.0` for any face referencing out-of-range or
    /// coincident vertices.
    pub fn face_area(&self, face: &Face) -> f32 {
        let [a, b, c] = face.vertex;
        let (a, b, c) = (
            self.vertices[a as usize].position,
            self.vertices[b as usize].position,
            self.vertices[c as usize].position,
        );
        0.5 * (b - a).cross(c - a).magnitude()
    }

    /// Geometric normal of a face (not normalized to unit length by
    /// the cross product alone unless `normalize` is applied by the
    /// caller); zero for a degenerate triangle.
    pub fn face_geometric_normal(&self, face: &Face) -> Vector3 {
        let [a, b, c] = face.vertex;
        let (a, b, c) = (
            self.vertices[a as usize].position,
            self.vertices[b as usize].position,
            self.vertices[c as usize].position,
        );
        (b - a).cross(c - a)
    }

    /// True iff `face` has two identical vertex indices.
    pub fn is_index_degenerate(face: &Face) -> bool {
        face.vertex[0] == face.vertex[1] || face.vertex[1] == face.vertex[2] || face.vertex[2] == face.vertex[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        Mesh::from_positions_and_indices(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn flags_round_trip() {
        let mut flags = ElementFlags::empty();
        assert!(!flags.has(ElementFlags::DELETED));
        flags.set(ElementFlags::DELETED | ElementFlags::BORDER);
        assert!(flags.has(ElementFlags::DELETED));
        assert!(flags.has(ElementFlags::BORDER));
        flags.clear(ElementFlags::DELETED);
        assert!(!flags.has(ElementFlags::DELETED));
        assert!(flags.has(ElementFlags::BORDER));
    }

    #[test]
    fn face_area_of_unit_triangle() {
        let mesh = unit_triangle();
        let area = mesh.face_area(&mesh.faces()[0]);
        assert!((area - 0.5).abs() < 1e-6);
    }

    #[test]
    fn compact_remaps_indices_and_drops_deleted() {
        let mut mesh = unit_triangle();
        mesh.push_vertex(Vertex::new(Point3::new(9.0, 9.0, 9.0)));
        mesh.faces_mut()[0].flags.set(ElementFlags::DELETED);
        mesh.compact();
        assert_eq!(mesh.live_face_count(), 0);
        assert_eq!(mesh.vertices().len(), 1);
    }

    #[test]
    fn degenerate_index_detection() {
        let face = Face::new(0, 0, 1);
        assert!(Mesh::is_index_degenerate(&face));
        let face = Face::new(0, 1, 2);
        assert!(!Mesh::is_index_degenerate(&face));
    }
}
