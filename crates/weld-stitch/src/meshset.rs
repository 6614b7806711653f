//! `MeshSet`: a collection of meshes built over one shared arena.
//!
//! [`MeshSet::from_meshes`] and [`MeshSet::clone_face_with_loop`] use a
//! position-keyed consolidation table lifted straight from `sew.rs`'s
//! `VertexPosKey` / `merge_nearby_vertices` — quantize a position to an
//! integer grid at `Tolerances::vertex_merge` and use that as a hash key,
//! so two vertices built from independent float computations that land
//! within tolerance of each other collapse onto the same arena slot
//! before stitching ever sees them. That is what lets `from_meshes`
//! actually weld independently-authored pieces together at a shared seam
//! instead of just concatenating them. [`MeshSet::from_points_and_faces`]
//! does not use this table: a vertex's identity there is the index the
//! caller gave it, copied into the arena 1:1, never merged by coordinate.

use std::collections::HashMap;

use weld_math::{Aabb, Point3};
use weld_topo::{Arena, FaceId, VertexId};

use crate::error::StitchError;
use crate::mesh::{assemble_meshes, Mesh};
use crate::stitch::stitch;
use crate::tolerances::Tolerances;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexPosKey(i64, i64, i64);

impl VertexPosKey {
    fn new(p: &Point3, tol: f64) -> Self {
        let q = |v: f64| (v / tol).round() as i64;
        VertexPosKey(q(p.x), q(p.y), q(p.z))
    }
}

/// A collection of meshes sharing one half-edge arena and one
/// position-keyed vertex table.
///
/// Keys are stable across [`Clone`]: `slotmap` clones its internal slots
/// in place rather than reassigning generations, so a `FaceId`/`VertexId`
/// taken from the original `MeshSet` is still valid in the clone.
#[derive(Debug, Clone)]
pub struct MeshSet {
    arena: Arena,
    meshes: Vec<Mesh>,
    vertex_index: HashMap<VertexPosKey, VertexId>,
    tol: Tolerances,
}

impl MeshSet {
    /// Build a `MeshSet` from a flat point array and a flat face-index
    /// stream: `[n0, v0_0, .., v0_(n0-1), n1, v1_0, ..]`, each `n_k >= 3`.
    ///
    /// Each entry in `points` is copied into the arena 1:1 as its own
    /// vertex, by index — never merged with another entry by coordinate,
    /// even one within `tol.vertex_merge`. A vertex's identity here is its
    /// index in `points`, not its position; position-based consolidation
    /// is reserved for [`MeshSet::from_meshes`], which welds across
    /// independent backing stores that have no shared index space to
    /// identify vertices by.
    ///
    /// Returns [`StitchError::MalformedInput`] if a face declares fewer
    /// than 3 vertices, the stream ends mid-face, or a vertex index is
    /// out of range.
    pub fn from_points_and_faces(
        points: &[Point3],
        face_indices: &[usize],
        tol: Tolerances,
    ) -> Result<Self, StitchError> {
        let mut set = MeshSet {
            arena: Arena::new(),
            meshes: Vec::new(),
            vertex_index: HashMap::new(),
            tol,
        };

        let vertex_ids: Vec<VertexId> = points.iter().map(|&p| set.arena.add_vertex(p)).collect();
        let mut new_faces = Vec::new();
        let mut cursor = 0;

        while cursor < face_indices.len() {
            let n = face_indices[cursor];
            if n < 3 {
                return Err(StitchError::MalformedInput(format!(
                    "face at offset {cursor} declares {n} vertices, need at least 3"
                )));
            }
            if cursor + 1 + n > face_indices.len() {
                return Err(StitchError::MalformedInput(
                    "face-index stream ends mid-face".into(),
                ));
            }

            let mut ring = Vec::with_capacity(n);
            for &raw in &face_indices[cursor + 1..cursor + 1 + n] {
                let &id = vertex_ids.get(raw).ok_or_else(|| {
                    StitchError::MalformedInput(format!("vertex index {raw} out of range"))
                })?;
                ring.push(id);
            }

            new_faces.push(set.arena.make_face(&ring)?);
            cursor += 1 + n;
        }

        set.stitch_new_faces(new_faces)?;
        Ok(set)
    }

    /// Build a `MeshSet` by copying the faces of existing meshes (each
    /// paired with the arena it lives in) into one fresh, shared arena
    /// and re-stitching from scratch.
    ///
    /// Vertices within `tol.vertex_merge` of each other — including
    /// vertices from *different* source arenas — consolidate onto the
    /// same arena slot, so pieces authored independently but meeting at
    /// a shared seam weld into a single mesh.
    pub fn from_meshes(sources: &[(&Arena, &Mesh)], tol: Tolerances) -> Result<Self, StitchError> {
        let mut set = MeshSet {
            arena: Arena::new(),
            meshes: Vec::new(),
            vertex_index: HashMap::new(),
            tol,
        };

        let mut new_faces = Vec::new();
        for &(source_arena, mesh) in sources {
            for &face in &mesh.faces {
                let loop_points = source_arena.loop_vertex_positions(face);
                let ring: Vec<VertexId> = loop_points
                    .iter()
                    .map(|&p| set.consolidate_vertex(p))
                    .collect();
                let new_face = set.arena.make_face(&ring)?;
                set.arena.faces[new_face].tags = source_arena.faces[face].tags;
                new_faces.push(new_face);
            }
        }

        set.stitch_new_faces(new_faces)?;
        Ok(set)
    }

    fn consolidate_vertex(&mut self, p: Point3) -> VertexId {
        let key = VertexPosKey::new(&p, self.tol.vertex_merge);
        *self
            .vertex_index
            .entry(key)
            .or_insert_with(|| self.arena.add_vertex(p))
    }

    fn stitch_new_faces(&mut self, faces: Vec<FaceId>) -> Result<(), StitchError> {
        if faces.is_empty() {
            return Ok(());
        }
        let outcome = stitch(&mut self.arena, &faces, &self.tol)?;
        self.meshes.append(&mut assemble_meshes(&self.arena, &outcome));
        Ok(())
    }

    /// The shared arena backing every mesh in this set.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The meshes assembled so far, in the order their first face was stitched.
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// All faces across all meshes, in stable order (concatenated
    /// per-mesh, in mesh order).
    pub fn face_iter(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.meshes.iter().flat_map(|m| m.faces.iter().copied())
    }

    /// The axis-aligned bounding box over every vertex this set's faces
    /// touch, or `None` if it holds no faces.
    pub fn aabb(&self) -> Option<Aabb> {
        let points: Vec<Point3> = self
            .face_iter()
            .flat_map(|f| self.arena.loop_vertex_positions(f))
            .collect();
        Aabb::from_points(points)
    }

    /// Build a new, unstitched face from an explicit 3D point loop,
    /// consolidating each point against this set's shared vertex table
    /// and copying `base`'s tags onto it. Reverses the loop first when
    /// `flipped` is set.
    ///
    /// The new face's plane is refit from `verts`, but its projection is
    /// copied from `base` verbatim rather than re-derived: for a flipped
    /// loop, re-deriving from the new (reversed) winding's 2D signed area
    /// could legitimately choose a different dominant axis or swap than
    /// `base` had, which would put the clone in a different 2D coordinate
    /// convention than its source.
    ///
    /// The returned face has no mesh component assigned — it exists for
    /// outer algorithms (e.g. a future Boolean classifier) that build a
    /// new face set and call [`MeshSet::from_meshes`]-style stitching
    /// themselves once they're done producing faces.
    pub fn clone_face_with_loop(
        &mut self,
        base: FaceId,
        verts: &[Point3],
        flipped: bool,
    ) -> Result<FaceId, StitchError> {
        let mut ids: Vec<VertexId> = verts.iter().map(|&p| self.consolidate_vertex(p)).collect();
        if flipped {
            ids.reverse();
        }
        let projection = self.arena.faces[base].projection;
        let face = self.arena.make_face_with_projection(&ids, projection)?;
        self.arena.faces[face].tags = self.arena.faces[base].tags;
        Ok(face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn cube_points_and_faces() -> (Vec<Point3>, Vec<usize>) {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces: Vec<Vec<usize>> = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![1, 2, 6, 5],
            vec![3, 0, 4, 7],
        ];
        let mut flat = Vec::new();
        for f in &faces {
            flat.push(f.len());
            flat.extend(f);
        }
        (points, flat)
    }

    #[test]
    fn test_cube_is_closed() {
        let (points, flat) = cube_points_and_faces();
        let set = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default()).unwrap();
        assert_eq!(set.meshes().len(), 1);
        assert!(set.meshes()[0].is_closed);
        assert!(!set.meshes()[0].is_negative);
    }

    #[test]
    fn test_malformed_face_too_few_vertices() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let flat = vec![2, 0, 1];
        let err = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default())
            .unwrap_err();
        assert!(matches!(err, StitchError::MalformedInput(_)));
    }

    #[test]
    fn test_collinear_face_reports_degenerate_via_topo_error() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let flat = vec![3, 0, 1, 2];
        let err = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default())
            .unwrap_err();
        assert!(matches!(
            err,
            StitchError::Topo(weld_topo::TopoError::DegenerateFace)
        ));
    }

    #[test]
    fn test_vertex_index_out_of_range() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let flat = vec![3, 0, 1, 9];
        let err = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default())
            .unwrap_err();
        assert!(matches!(err, StitchError::MalformedInput(_)));
    }

    /// Two distinct `points[]` entries that happen to quantize to the same
    /// `VertexPosKey` (well within `tol.vertex_merge`) stay distinct arena
    /// vertices: `from_points_and_faces` copies by index, it does not weld
    /// by coordinate.
    #[test]
    fn test_from_points_and_faces_does_not_merge_near_duplicate_points() {
        let tol = Tolerances::default();
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            // A near-duplicate of points[0], well inside tol.vertex_merge.
            Point3::new(0.0, 0.0, tol.vertex_merge / 10.0),
        ];
        let flat = vec![4, 0, 1, 2, 3];
        let set = MeshSet::from_points_and_faces(&points, &flat, tol).unwrap();
        assert_eq!(set.arena().vertices.len(), points.len());
    }

    #[test]
    fn test_face_stream_ends_mid_face() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let flat = vec![4, 0, 1, 2];
        let err = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default())
            .unwrap_err();
        assert!(matches!(err, StitchError::MalformedInput(_)));
    }

    #[test]
    fn test_clone_keeps_handles_valid() {
        let (points, flat) = cube_points_and_faces();
        let set = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default()).unwrap();
        let cloned = set.clone();
        let original_face = set.face_iter().next().unwrap();
        assert!(cloned.arena().faces.get(original_face).is_some());
        assert_eq!(set.aabb(), cloned.aabb());
    }

    #[test]
    fn test_aabb_matches_unit_cube() {
        let (points, flat) = cube_points_and_faces();
        let set = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default()).unwrap();
        let aabb = set.aabb().unwrap();
        assert!((aabb.min - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((aabb.max - Point3::new(1.0, 1.0, 1.0)).norm() < 1e-9);
    }

    /// Two unit squares, built in independent arenas with their own
    /// (numerically coincident but distinct) vertices along the shared
    /// edge, weld into a single two-face mesh when combined.
    #[test]
    fn test_from_meshes_welds_independent_pieces_at_shared_seam() {
        let mut arena_a = Arena::new();
        let a0 = arena_a.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let a1 = arena_a.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let a2 = arena_a.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let a3 = arena_a.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let face_a = arena_a.make_face(&[a0, a1, a2, a3]).unwrap();
        let outcome_a = stitch(&mut arena_a, &[face_a], &Tolerances::default()).unwrap();
        let meshes_a = assemble_meshes(&arena_a, &outcome_a);

        let mut arena_b = Arena::new();
        let b0 = arena_b.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let b1 = arena_b.add_vertex(Point3::new(2.0, 0.0, 0.0));
        let b2 = arena_b.add_vertex(Point3::new(2.0, 1.0, 0.0));
        let b3 = arena_b.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let face_b = arena_b.make_face(&[b0, b1, b2, b3]).unwrap();
        let outcome_b = stitch(&mut arena_b, &[face_b], &Tolerances::default()).unwrap();
        let meshes_b = assemble_meshes(&arena_b, &outcome_b);

        let combined = MeshSet::from_meshes(
            &[(&arena_a, &meshes_a[0]), (&arena_b, &meshes_b[0])],
            Tolerances::default(),
        )
        .unwrap();

        assert_eq!(combined.meshes().len(), 1);
        let mesh = &combined.meshes()[0];
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.closed_edges.len(), 1);
        assert_eq!(mesh.open_edges.len(), 6);
    }

    /// `clone_face_with_loop` with `flipped = true` reverses the loop's
    /// winding, which would independently re-derive a different swap if
    /// the projection were recomputed from scratch; it must instead carry
    /// `base`'s projection over unchanged.
    #[test]
    fn test_clone_face_with_loop_reuses_base_projection_when_flipped() {
        let (points, flat) = cube_points_and_faces();
        let mut set = MeshSet::from_points_and_faces(&points, &flat, Tolerances::default()).unwrap();
        let base = set.face_iter().next().unwrap();
        let base_projection = set.arena().faces[base].projection;
        let base_tags = set.arena().faces[base].tags;

        let verts = set.arena().loop_vertex_positions(base);
        let clone = set.clone_face_with_loop(base, &verts, true).unwrap();

        assert_eq!(set.arena().faces[clone].projection, base_projection);
        assert_eq!(set.arena().faces[clone].tags, base_tags);
        assert!(set.arena().faces[clone].component.is_none());
    }

    #[test]
    fn test_cube_assembly_is_invariant_to_face_order() {
        let (points, flat) = cube_points_and_faces();
        let faces: Vec<Vec<usize>> = {
            let mut out = Vec::new();
            let mut cursor = 0;
            while cursor < flat.len() {
                let n = flat[cursor];
                out.push(flat[cursor + 1..cursor + 1 + n].to_vec());
                cursor += 1 + n;
            }
            out
        };

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            let mut shuffled = faces.clone();
            shuffled.shuffle(&mut rng);
            let mut reflat = Vec::new();
            for f in &shuffled {
                reflat.push(f.len());
                reflat.extend(f);
            }
            let set =
                MeshSet::from_points_and_faces(&points, &reflat, Tolerances::default()).unwrap();
            assert_eq!(set.meshes().len(), 1);
            assert!(set.meshes()[0].is_closed);
            assert_eq!(set.meshes()[0].closed_edges.len(), 12);
            assert!(!set.meshes()[0].is_negative);
        }
    }
}
