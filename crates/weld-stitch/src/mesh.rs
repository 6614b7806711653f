//! A mesh: one connected component of stitched faces, classified by
//! open/closed half-edges and, for closed meshes, by orientation.

use std::collections::HashMap;

use slotmap::Key;
use weld_topo::{Arena, FaceId, HalfEdgeId};

use crate::dsu::Dsu;
use crate::stitch::StitchOutcome;

/// One connected component produced by stitching: its faces, its
/// boundary classification, and — when closed — whether it encloses
/// negative volume (an inverted/subtracted solid rather than a normal one).
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Faces belonging to this mesh, in the order they were assigned.
    pub faces: Vec<FaceId>,
    /// Half-edges with no twin: this mesh has a boundary.
    pub open_edges: Vec<HalfEdgeId>,
    /// Half-edges with a twin, one entry per pair (the lower-id half of
    /// the pair, by `KeyData::as_ffi`, arbitrarily but deterministically).
    pub closed_edges: Vec<HalfEdgeId>,
    /// Whether this mesh is closed (`open_edges` is empty).
    pub is_closed: bool,
    /// For a closed mesh, whether it encloses negative volume by the
    /// divergence-theorem sign convention. Always `false` for an open mesh.
    pub is_negative: bool,
}

/// Bucket `outcome.faces` by DSU component and build one [`Mesh`] per
/// component, in order of first appearance.
pub fn assemble_meshes(arena: &Arena, outcome: &StitchOutcome) -> Vec<Mesh> {
    let mut dsu = outcome.dsu.clone();
    let mut order: Vec<usize> = Vec::new();
    let mut buckets: HashMap<usize, Vec<FaceId>> = HashMap::new();

    for &f in &outcome.faces {
        let root = dsu.find(outcome.dense_id[&f]);
        if !buckets.contains_key(&root) {
            order.push(root);
        }
        buckets.entry(root).or_default().push(f);
    }

    order
        .into_iter()
        .map(|root| build_mesh(arena, buckets.remove(&root).unwrap()))
        .collect()
}

fn build_mesh(arena: &Arena, faces: Vec<FaceId>) -> Mesh {
    let mut open_edges = Vec::new();
    let mut closed_edges = Vec::new();
    let mut seen_pairs = std::collections::HashSet::new();

    for &f in &faces {
        for he in arena.loop_half_edges(arena.faces[f].first_edge) {
            match arena.half_edges[he].twin {
                None => open_edges.push(he),
                Some(twin) => {
                    let canonical = if he.data().as_ffi() < twin.data().as_ffi() {
                        he
                    } else {
                        twin
                    };
                    if seen_pairs.insert(canonical) {
                        closed_edges.push(canonical);
                    }
                }
            }
        }
    }

    let is_closed = open_edges.is_empty();
    let is_negative = is_closed && signed_volume(arena, &faces) < 0.0;

    Mesh {
        faces,
        open_edges,
        closed_edges,
        is_closed,
        is_negative,
    }
}

/// The signed volume enclosed by `faces`, via the divergence theorem:
/// fan-triangulate each planar face from its first vertex and sum signed
/// tetrahedron volumes from the origin. Exact for a closed, consistently
/// wound mesh regardless of where the origin sits, and — unlike summing
/// `dot(centroid, normal) * area` from a face's 2D projection — doesn't
/// need a true (unforeshortened) face area, since the fan triangles are
/// full 3D triangles, not projected ones.
fn signed_volume(arena: &Arena, faces: &[FaceId]) -> f64 {
    let mut acc = 0.0;
    for &f in faces {
        let points = arena.loop_vertex_positions(f);
        let v0 = points[0].coords;
        for i in 1..points.len() - 1 {
            let v1 = points[i].coords;
            let v2 = points[i + 1].coords;
            acc += v0.dot(&v1.cross(&v2));
        }
    }
    acc / 6.0
}
