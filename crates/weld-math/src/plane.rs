//! Plane fitting and the 3D → 2D projection used to turn a planar polygon
//! into coordinates a 2D algorithm can work with.

use crate::{polygon_signed_area_2d, Point3, Vec3};

/// A plane equation `dot(normal, p) == offset`, with `normal` a unit vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance from the origin along `normal`.
    pub offset: f64,
}

impl Plane {
    /// Signed distance from `p` to this plane (positive on the side `normal`
    /// points toward).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    /// Fit a plane through an ordered vertex loop using Newell's method.
    ///
    /// Newell's method sums cross products of consecutive edges, which
    /// tolerates mild non-planarity (the loop need not be exactly flat) and
    /// degenerates gracefully to a zero vector when the loop is collinear
    /// or has fewer than 3 distinct points. Returns `None` in that case —
    /// callers should report `DegenerateFace`.
    pub fn fit_newell(loop_points: &[Point3]) -> Option<Plane> {
        if loop_points.len() < 3 {
            return None;
        }
        let n = loop_points.len();
        let mut normal = Vec3::zeros();
        let mut centroid = Vec3::zeros();
        for i in 0..n {
            let cur = loop_points[i];
            let next = loop_points[(i + 1) % n];
            normal.x += (cur.y - next.y) * (cur.z + next.z);
            normal.y += (cur.z - next.z) * (cur.x + next.x);
            normal.z += (cur.x - next.x) * (cur.y + next.y);
            centroid += cur.coords;
        }
        let len = normal.norm();
        if len < 1e-12 {
            return None;
        }
        normal /= len;
        centroid /= n as f64;
        let offset = normal.dot(&centroid);
        Some(Plane { normal, offset })
    }
}

/// The axis a [`Projection`] drops to go from 3D to 2D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis3 {
    /// Drop the X coordinate, keep (Y, Z).
    X,
    /// Drop the Y coordinate, keep (Z, X).
    Y,
    /// Drop the Z coordinate, keep (X, Y).
    Z,
}

/// An axis-aligned drop from 3D to 2D, chosen per-face so that planar
/// polygon algorithms (signed area, point-in-polygon) can operate in 2D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    dominant: Axis3,
    swap: bool,
}

impl Projection {
    /// Choose the projection matching the largest absolute component of
    /// `normal`, with the axis order picked so a loop wound consistently
    /// with `normal` projects to a positive-area 2D polygon.
    ///
    /// This is a starting guess, not a guarantee: [`Projection::oriented_for`]
    /// double-checks against the actual projected loop and flips if needed,
    /// since the sign convention here is a heuristic rather than a proof.
    pub fn for_normal(normal: &Vec3) -> Self {
        let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
        if ax >= ay && ax >= az {
            Projection {
                dominant: Axis3::X,
                swap: normal.x < 0.0,
            }
        } else if ay >= ax && ay >= az {
            Projection {
                dominant: Axis3::Y,
                swap: normal.y < 0.0,
            }
        } else {
            Projection {
                dominant: Axis3::Z,
                swap: normal.z < 0.0,
            }
        }
    }

    /// [`Projection::for_normal`], then flip chirality if needed so that
    /// projecting `loop_points` yields a positive-area 2D polygon.
    pub fn oriented_for(normal: &Vec3, loop_points: &[Point3]) -> Self {
        let mut proj = Projection::for_normal(normal);
        let area: f64 = polygon_signed_area_2d(
            &loop_points
                .iter()
                .map(|p| proj.project(p))
                .collect::<Vec<_>>(),
        );
        if area < 0.0 {
            proj.swap = !proj.swap;
        }
        proj
    }

    /// Drop the dominant axis, producing 2D coordinates.
    pub fn project(&self, p: &Point3) -> [f64; 2] {
        let (u, v) = match self.dominant {
            Axis3::X => (p.y, p.z),
            Axis3::Y => (p.z, p.x),
            Axis3::Z => (p.x, p.y),
        };
        if self.swap {
            [v, u]
        } else {
            [u, v]
        }
    }

    /// Reconstruct a 3D point from 2D coordinates produced by [`Projection::project`],
    /// solving for the dropped coordinate using `plane`'s equation.
    pub fn unproject(&self, uv: [f64; 2], plane: &Plane) -> Point3 {
        let (u, v) = if self.swap {
            (uv[1], uv[0])
        } else {
            (uv[0], uv[1])
        };
        let n = &plane.normal;
        match self.dominant {
            Axis3::X => {
                let x = (plane.offset - n.y * u - n.z * v) / n.x;
                Point3::new(x, u, v)
            }
            Axis3::Y => {
                let y = (plane.offset - n.z * u - n.x * v) / n.y;
                Point3::new(v, y, u)
            }
            Axis3::Z => {
                let z = (plane.offset - n.x * u - n.y * v) / n.z;
                Point3::new(u, v, z)
            }
        }
    }
}
