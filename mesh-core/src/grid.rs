//! A uniform spatial grid over face bounding boxes, used to scope
//! self-intersection queries and the hole filler's local
//! intersection veto to nearby geometry instead of all-pairs checks.
//!
//! Same idea as a hashed point cloud (bin by cell, probe a 3x3x3
//! neighborhood) adapted from points to triangle bounding boxes.

use crate::base::{BoundingBox, Point3};
use rustc_hash::FxHashMap;

type CellIndex = (i32, i32, i32);

/// A uniform grid binning face indices by the cells their bounding
/// box overlaps. Built fresh for each query that needs it and
/// discarded afterwards — no state persists between predicate or
/// hole-filler invocations (Concurrency & Resource Model).
#[derive(Debug)]
pub struct FaceGrid {
    cell_size: f32,
    origin: Point3,
    cells: FxHashMap<CellIndex, Vec<u32>>,
}

impl FaceGrid {
    /// Builds a grid over `faces` (given as `(index, [Point3; 3])`)
    /// sized so that a typical triangle spans roughly one cell.
    pub fn build<'a>(bbox: &BoundingBox, faces: impl Iterator<Item = (u32, [Point3; 3])>) -> Self {
        let extent = bbox.max_extent().max(1.0e-6);
        // Aim for roughly 32 cells along the longest axis; a coarser
        // grid degrades to near-linear scans, a finer one wastes
        // memory on sparse meshes, both safe failure modes.
        let cell_size = (extent / 32.0).max(1.0e-6);
        let origin = bbox.min();
        let mut grid = FaceGrid {
            cell_size,
            origin,
            cells: FxHashMap::default(),
        };
        for (face_idx, triangle) in faces {
            let face_bbox = BoundingBox::from_points(&triangle);
            for cell in grid.cells_overlapping(&face_bbox) {
                grid.cells.entry(cell).or_default().push(face_idx);
            }
        }
        grid
    }

    fn cell_of(&self, point: Point3) -> CellIndex {
        (
            ((point.x - self.origin.x) / self.cell_size).floor() as i32,
            ((point.y - self.origin.y) / self.cell_size).floor() as i32,
            ((point.z - self.origin.z) / self.cell_size).floor() as i32,
        )
    }

    fn cells_overlapping(&self, bbox: &BoundingBox) -> Vec<CellIndex> {
        let lo = self.cell_of(bbox.min());
        let hi = self.cell_of(bbox.max());
        let mut out = Vec::new();
        for x in lo.0..=hi.0 {
            for y in lo.1..=hi.1 {
                for z in lo.2..=hi.2 {
                    out.push((x, y, z));
                }
            }
        }
        out
    }

    /// Every face index whose bounding box lies in a cell overlapping
    /// `bbox`, deduplicated. A superset of the faces that actually
    /// intersect `bbox` — callers still do a precise test.
    pub fn candidates_near(&self, bbox: &BoundingBox) -> Vec<u32> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        for cell in self.cells_overlapping(bbox) {
            if let Some(faces) = self.cells.get(&cell) {
                for &f in faces {
                    if seen.insert(f) {
                        out.push(f);
                    }
                }
            }
        }
        out
    }
}
