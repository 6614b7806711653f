//! Error types for stitching and `MeshSet` construction.

use thiserror::Error;
use weld_topo::TopoError;

/// Errors from stitching a set of faces into meshes, or from building a
/// `MeshSet` from raw input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StitchError {
    /// Flat point/face-index input failed the shape checks described in
    /// the `MeshSet` constructor: an index out of range, a face with
    /// fewer than three vertices, or a face-index array whose length
    /// doesn't match the declared face count and vertex counts.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A single face's ring visits the same directed edge (ordered vertex
    /// pair) more than once.
    #[error("malformed face: repeats a directed edge in its own ring")]
    MalformedFace,

    /// A caller-side invariant the stitcher relies on was violated, e.g.
    /// stitching a face that was already assigned to a mesh component.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    /// A face could not be built or rebuilt (degenerate plane fit).
    #[error(transparent)]
    Topo(#[from] TopoError),
}
