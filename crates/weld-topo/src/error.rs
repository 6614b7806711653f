//! Error types for face construction.

use thiserror::Error;

/// Errors from building or recomputing a face's plane and projection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopoError {
    /// The plane fit through the face's vertex loop produced a
    /// negligible-magnitude normal (collinear or coincident vertices).
    #[error("face is degenerate: plane fit produced a zero-magnitude normal")]
    DegenerateFace,
}
