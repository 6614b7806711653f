//! Tolerance bundle threaded through stitching instead of global constants.
//!
//! `vcad-kernel-booleans::sew::sew_faces` takes its tolerance as a trailing
//! `f64` parameter rather than reaching for a crate-wide constant; `Tolerances`
//! generalizes that one number into the handful the stitcher actually needs,
//! still passed explicitly rather than hidden behind a `const`.

/// Tolerances governing face-stitching decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Maximum distance (in vertex-position units) a point may sit off a
    /// candidate patch plane and still be treated as coplanar, used when
    /// deciding whether an open-edge cycle is planar enough to patch.
    pub planarity: f64,
    /// Minimum normal magnitude below which a plane fit is treated as
    /// degenerate. Mirrors the zero-check inside `Plane::fit_newell`, but
    /// exposed here so callers can make the same judgement about a
    /// normal they computed themselves (e.g. a complex-edge `base_dir`).
    pub degenerate_normal: f64,
    /// Distance below which two vertex positions are considered the same
    /// point when consolidating a `MeshSet`'s shared arena.
    pub vertex_merge: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            planarity: 1e-6,
            degenerate_normal: 1e-12,
            vertex_merge: 1e-9,
        }
    }
}
