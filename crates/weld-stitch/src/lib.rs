#![warn(missing_docs)]

//! Face stitching, mesh assembly, and `MeshSet` storage for the weld
//! mesh-stitching core.
//!
//! This is the layer that turns a bag of independently-built planar
//! [`weld_topo::Face`]s into paired half-edges, partitions them into
//! connected [`Mesh`]es via a [`Dsu`], classifies each mesh open or
//! closed, and — for closed meshes — derives orientation from enclosed
//! volume. [`MeshSet`] is the storage type client code actually holds:
//! one shared, vertex-consolidating arena plus the meshes built over it.
//!
//! In the spirit of `vcad-kernel-booleans`'s module doc (a short
//! pipeline description up top, details in the functions) rather than
//! `vcad-kernel-topo`'s denser per-type documentation — this crate's
//! types are fewer and each carries more behavior, so the prose lives
//! at the module level and trails off per-field.

pub mod dsu;
pub mod error;
pub mod mesh;
pub mod meshset;
pub mod stitch;
pub mod tolerances;

pub use dsu::Dsu;
pub use error::StitchError;
pub use mesh::{assemble_meshes, Mesh};
pub use meshset::MeshSet;
pub use stitch::{stitch, StitchOutcome};
pub use tolerances::Tolerances;
