//! Scalar type, tolerance constants, and the axis-aligned bounding box.
//!
//! Positions and normals are single-precision, per the data model:
//! this crate never promotes coordinates to `f64`.

use cgmath::{BaseFloat, EuclideanSpace, MetricSpace};
use serde::{Deserialize, Serialize};

/// 3D point with single-precision coordinates.
pub type Point3 = cgmath::Point3<f32>;
/// 3D vector with single-precision coordinates.
pub type Vector3 = cgmath::Vector3<f32>;

/// General geometric tolerance used by area/degeneracy/merge predicates.
///
/// Distinct from the *exact* `==` equality §4.3 mandates for
/// duplicate-vertex merging: that operation intentionally bypasses
/// this tolerance (Open Question (a) — see DESIGN.md).
pub const TOLERANCE: f32 = 1.0e-5;

/// Squared [`TOLERANCE`], for comparisons against squared distances.
pub const TOLERANCE2: f32 = TOLERANCE * TOLERANCE;

/// Types that admit a tolerance-based "near enough" comparison.
pub trait Tolerance: cgmath::AbsDiffEq<Epsilon = f32> {
    /// True if the two values are within [`TOLERANCE`] of each other.
    fn near(&self, other: &Self) -> bool { self.abs_diff_eq(other, TOLERANCE) }
}
impl<T: cgmath::AbsDiffEq<Epsilon = f32>> Tolerance for T {}

/// An axis-aligned bounding box over [`Point3`].
///
/// Degenerate (empty) boxes are represented with `min` at
/// `+infinity` and `max` at `-infinity`, so `push` always shrinks
/// towards the true extent and `is_empty` is a cheap comparison.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }
}

impl BoundingBox {
    /// An empty bounding box, ready to be grown with [`push`](Self::push).
    pub fn new() -> Self { Self::default() }

    /// Grows the box to include `point`.
    pub fn push(&mut self, point: Point3) {
        self.min = Point3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Point3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    /// Builds a box over an iterator of points; empty iterators yield
    /// the empty box.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bbox = Self::new();
        points.into_iter().for_each(|p| bbox.push(*p));
        bbox
    }

    /// True iff no point has ever been pushed.
    pub fn is_empty(&self) -> bool { self.min.x > self.max.x }

    /// Lower corner. Meaningless on an empty box.
    pub fn min(&self) -> Point3 { self.min }
    /// Upper corner. Meaningless on an empty box.
    pub fn max(&self) -> Point3 { self.max }

    /// `max - min`, per axis.
    pub fn diagonal(&self) -> Vector3 { self.max - self.min }

    /// Largest of the three axis extents; `0.0` on an empty box.
    pub fn max_extent(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        d.x.max(d.y).max(d.z)
    }

    /// True iff `point` falls within the box, inclusive of the faces.
    pub fn contains(&self, point: Point3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// True iff the two boxes overlap (touching faces count as overlap).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Euclidean distance between two points, exposed for the predicate
/// suite without pulling `cgmath::MetricSpace` into every call site.
pub fn distance(a: Point3, b: Point3) -> f32 { MetricSpace::distance(a, b) }

/// `S::zero()` wrapper used by the grid hashing code in [`crate::grid`].
pub fn zero_point() -> Point3 { Point3::origin() }

#[allow(dead_code)]
fn _assert_basefloat_f32() {
    fn is_base_float<S: BaseFloat>() {}
    is_base_float::<f32>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_has_no_extent() {
        let bbox = BoundingBox::new();
        assert!(bbox.is_empty());
        assert_eq!(bbox.max_extent(), 0.0);
    }

    #[test]
    fn push_grows_to_cover_points() {
        let pts = [
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 2.0, -3.0),
        ];
        let bbox = BoundingBox::from_points(&pts);
        assert_eq!(bbox.min(), Point3::new(-1.0, -1.0, -3.0));
        assert_eq!(bbox.max(), Point3::new(1.0, 2.0, 1.0));
        assert!(bbox.contains(Point3::new(0.0, 0.0, 0.0)));
        assert!(!bbox.contains(Point3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn intersects_is_symmetric() {
        let a = BoundingBox::from_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)]);
        let b = BoundingBox::from_points(&[Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0)]);
        let c = BoundingBox::from_points(&[Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0)]);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }
}
