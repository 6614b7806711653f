#![warn(missing_docs)]

//! Half-edge mesh topology: the arena, the half-edge/face primitives, and
//! the face builder.
//!
//! Arena-based (slotmap) half-edge data structure, in the style of
//! `vcad-kernel-topo`'s `Topology`, but scoped to what a bag-of-polygons
//! mesh needs rather than a full B-rep: vertices, half-edges, and faces —
//! no loops-with-holes, shells, or solids. A [`Face`] owns its half-edge
//! ring directly via `first_edge`; [`Mesh`]/[`MeshSet`] (in `weld-stitch`)
//! group faces without a separate shell/solid layer.

pub mod error;
pub mod tags;

pub use error::TopoError;
pub use tags::TagSet;

use slotmap::{new_key_type, SlotMap};
use weld_math::{Plane, Point3, Projection};

new_key_type! {
    /// Handle for a vertex in the arena.
    pub struct VertexId;
    /// Handle for a half-edge in the arena.
    pub struct HalfEdgeId;
    /// Handle for a face in the arena.
    pub struct FaceId;
}

/// A vertex — a point in 3D space plus opaque tag bits.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// 3D position.
    pub point: Point3,
    /// Opaque tag bits for outer algorithms.
    pub tags: TagSet,
}

/// A half-edge — one directed traversal of a face's boundary.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// Origin vertex of this half-edge.
    pub origin: VertexId,
    /// The face this half-edge bounds.
    pub face: FaceId,
    /// Next half-edge in the face's ring.
    pub next: HalfEdgeId,
    /// Previous half-edge in the face's ring.
    pub prev: HalfEdgeId,
    /// The opposing half-edge on the adjacent face, if paired.
    pub twin: Option<HalfEdgeId>,
}

/// A face — a planar polygon bounded by a half-edge ring.
#[derive(Debug, Clone)]
pub struct Face {
    /// An arbitrary half-edge of this face's ring.
    pub first_edge: HalfEdgeId,
    /// Number of half-edges in the ring.
    pub n_edges: u32,
    /// The face's plane equation, fit through its vertex loop.
    pub plane: Plane,
    /// The 3D→2D projection chosen for this face.
    pub projection: Projection,
    /// Mesh-component id assigned by the stitcher, `None` before stitching.
    pub component: Option<u32>,
    /// Opaque tag bits for outer algorithms.
    pub tags: TagSet,
}

/// The half-edge arena — owns every vertex, half-edge, and face.
///
/// Shared by every mesh a `MeshSet` holds (see `weld-stitch`), the way
/// `vcad-kernel-topo`'s `Topology` is shared by every shell and solid of a
/// single B-rep: one arena, many groupings over it.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    /// All vertices.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// All half-edges.
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    /// All faces.
    pub faces: SlotMap<FaceId, Face>,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            half_edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
        }
    }

    /// Insert a vertex at the given point, with empty tags.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(Vertex {
            point,
            tags: TagSet::empty(),
        })
    }

    /// Build a face from an ordered vertex loop: wires up the half-edge
    /// ring, fits a plane through the loop via Newell's method, and picks
    /// a projection axis.
    ///
    /// Fails with [`TopoError::DegenerateFace`] when the loop is collinear
    /// or coincident (zero-magnitude normal). Expects `verts.len() >= 3`
    /// (callers parsing external input validate the count themselves and
    /// report `MalformedInput` before reaching here).
    pub fn make_face(&mut self, verts: &[VertexId]) -> Result<FaceId, TopoError> {
        let loop_points: Vec<Point3> = verts.iter().map(|&v| self.vertices[v].point).collect();
        let plane = Plane::fit_newell(&loop_points).ok_or(TopoError::DegenerateFace)?;
        let projection = Projection::oriented_for(&plane.normal, &loop_points);
        Ok(self.insert_face(verts, plane, projection))
    }

    /// Build a face from an ordered vertex loop, refitting the plane but
    /// reusing `projection` verbatim instead of deriving a fresh one.
    ///
    /// For a loop whose winding was deliberately reversed from some other
    /// face's (e.g. a clone-with-flip operation), re-deriving the
    /// projection from the new loop's 2D signed area could legitimately
    /// pick a different dominant axis or swap than the original face had;
    /// this entry point keeps the projection fixed so the derived face
    /// stays in the same 2D coordinate convention as its source.
    ///
    /// Fails with [`TopoError::DegenerateFace`] under the same condition
    /// as [`Arena::make_face`].
    pub fn make_face_with_projection(
        &mut self,
        verts: &[VertexId],
        projection: Projection,
    ) -> Result<FaceId, TopoError> {
        let loop_points: Vec<Point3> = verts.iter().map(|&v| self.vertices[v].point).collect();
        let plane = Plane::fit_newell(&loop_points).ok_or(TopoError::DegenerateFace)?;
        Ok(self.insert_face(verts, plane, projection))
    }

    fn insert_face(&mut self, verts: &[VertexId], plane: Plane, projection: Projection) -> FaceId {
        debug_assert!(verts.len() >= 3, "face must have at least 3 vertices");
        let n = verts.len();

        let half_edges: Vec<HalfEdgeId> = verts
            .iter()
            .map(|&origin| {
                self.half_edges.insert(HalfEdge {
                    origin,
                    face: FaceId::default(),
                    next: HalfEdgeId::default(),
                    prev: HalfEdgeId::default(),
                    twin: None,
                })
            })
            .collect();

        for i in 0..n {
            let next = half_edges[(i + 1) % n];
            let prev = half_edges[(i + n - 1) % n];
            let he = &mut self.half_edges[half_edges[i]];
            he.next = next;
            he.prev = prev;
        }

        let face_id = self.faces.insert(Face {
            first_edge: half_edges[0],
            n_edges: n as u32,
            plane,
            projection,
            component: None,
            tags: TagSet::empty(),
        });

        for &he in &half_edges {
            self.half_edges[he].face = face_id;
        }

        face_id
    }

    /// Recompute a face's plane and projection from its current vertex
    /// positions (e.g. after vertices were merged or moved).
    pub fn recalc_face(&mut self, face_id: FaceId) -> Result<(), TopoError> {
        let loop_points = self.loop_vertex_positions(face_id);
        let plane = Plane::fit_newell(&loop_points).ok_or(TopoError::DegenerateFace)?;
        let projection = Projection::oriented_for(&plane.normal, &loop_points);
        let face = &mut self.faces[face_id];
        face.plane = plane;
        face.projection = projection;
        Ok(())
    }

    /// The mean of a face's loop vertex positions.
    pub fn face_centroid(&self, face_id: FaceId) -> Point3 {
        let points = self.loop_vertex_positions(face_id);
        let n = points.len() as f64;
        let sum = points
            .iter()
            .fold(weld_math::Vec3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / n)
    }

    /// Vertex positions of a face's ring, in ring order.
    pub fn loop_vertex_positions(&self, face_id: FaceId) -> Vec<Point3> {
        self.loop_half_edges(self.faces[face_id].first_edge)
            .map(|he| self.vertices[self.half_edges[he].origin].point)
            .collect()
    }

    /// Walk a half-edge ring starting at `start`, following `next`.
    pub fn loop_half_edges(&self, start: HalfEdgeId) -> LoopHalfEdgeIter<'_> {
        LoopHalfEdgeIter {
            arena: self,
            start,
            current: Some(start),
            started: false,
        }
    }

    /// Destination vertex of a half-edge (origin of its `next`).
    pub fn half_edge_dest(&self, he: HalfEdgeId) -> VertexId {
        self.half_edges[self.half_edges[he].next].origin
    }
}

/// Iterator over the half-edges of a face's ring, in traversal order.
pub struct LoopHalfEdgeIter<'a> {
    arena: &'a Arena,
    start: HalfEdgeId,
    current: Option<HalfEdgeId>,
    started: bool,
}

impl<'a> Iterator for LoopHalfEdgeIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let current = self.current?;
        if self.started && current == self.start {
            return None;
        }
        self.started = true;
        self.current = Some(self.arena.half_edges[current].next);
        Some(current)
    }
}
