#![warn(missing_docs)]

//! Vector, plane, and AABB primitives for the weld mesh-stitching core.
//!
//! Small value types built directly on `nalgebra`, in the same spirit as
//! `vcad-kernel-math`: a handful of free functions and structs rather than
//! a wrapper API. `Point3`/`Vec3` give the `{dot, cross, norm}` capability
//! set the stitcher needs; callers reach for `nalgebra`'s own methods
//! (`.dot(..)`, `.cross(..)`, `.norm()`) directly.

pub mod aabb;
pub mod plane;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A displacement or direction in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

pub use aabb::Aabb;
pub use plane::{Axis3, Plane, Projection};

/// Signed area of a 2D polygon via the shoelace formula.
///
/// Positive for a counter-clockwise loop, negative for clockwise, zero for
/// a degenerate (collinear or self-overlapping-to-zero) loop.
pub fn polygon_signed_area_2d(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let [x0, y0] = points[i];
        let [x1, y1] = points[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum * 0.5
}
