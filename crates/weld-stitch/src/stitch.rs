//! The face stitcher: turns a bag of independently-built faces into
//! paired half-edges and a disjoint-set-union over mesh components.
//!
//! Mirrors `vcad-kernel-shell::pair_twin_half_edges` in spirit (a map
//! keyed by an edge identity, walked once to assign twins) but works
//! from vertex identity rather than quantized position — the faces
//! here already share an arena, so there is no vertex-dedup step to do
//! first — and adds the angular-sort resolution a bare 2-manifold
//! pairing pass doesn't need.

use std::collections::{HashMap, HashSet};

use slotmap::Key;
use weld_math::Plane;
use weld_topo::{Arena, FaceId, HalfEdgeId, VertexId};

use crate::dsu::Dsu;
use crate::error::StitchError;
use crate::tolerances::Tolerances;

/// The result of one stitch pass: every face that ended up part of it
/// (the input faces plus any patches synthesized to close a T-junction),
/// and the DSU + dense-id map the mesh assembler reads components from.
#[derive(Debug)]
pub struct StitchOutcome {
    /// All faces belonging to this stitch pass, input and synthesized.
    pub faces: Vec<FaceId>,
    /// Connectivity over `faces`, indexed via `dense_id`.
    pub dsu: Dsu,
    /// Dense integer id assigned to each face in `faces`.
    pub dense_id: HashMap<FaceId, usize>,
}

type EdgeKey = (VertexId, VertexId);

/// Stitch `face_ids` into twin-paired half-edges and mesh components.
///
/// Every face in `face_ids` must not already belong to a mesh
/// (`face.component` must be `None`); violating this returns
/// [`StitchError::PreconditionViolated`]. A face whose ring visits the
/// same directed edge twice returns [`StitchError::MalformedFace`].
pub fn stitch(
    arena: &mut Arena,
    face_ids: &[FaceId],
    tol: &Tolerances,
) -> Result<StitchOutcome, StitchError> {
    let mut dense_id = prepare(arena, face_ids)?;
    let mut dsu = Dsu::new(face_ids.len());
    let mut edge_map = build_edge_map(arena, face_ids)?;

    let complex = simple_pairing(arena, &mut edge_map, &mut dsu, &dense_id);
    resolve_complex_edges(arena, complex, &mut dsu, &dense_id, tol);

    let mut all_faces = face_ids.to_vec();
    handle_open_chains(arena, &mut all_faces, &mut dense_id, &mut dsu, tol);

    for &f in &all_faces {
        let component = dsu.find(dense_id[&f]) as u32;
        arena.faces[f].component = Some(component);
    }

    Ok(StitchOutcome {
        faces: all_faces,
        dsu,
        dense_id,
    })
}

/// Assign dense ids and clear any stale twin links left over from a
/// previous stitch of the same faces (re-stitching is expected to be
/// idempotent: it recomputes pairing from scratch every time).
fn prepare(arena: &mut Arena, face_ids: &[FaceId]) -> Result<HashMap<FaceId, usize>, StitchError> {
    let mut dense_id = HashMap::with_capacity(face_ids.len());
    for (i, &f) in face_ids.iter().enumerate() {
        if arena.faces[f].component.is_some() {
            return Err(StitchError::PreconditionViolated(
                "face already belongs to a mesh component".into(),
            ));
        }
        dense_id.insert(f, i);
    }
    for &f in face_ids {
        let hes: Vec<_> = arena.loop_half_edges(arena.faces[f].first_edge).collect();
        for he in hes {
            arena.half_edges[he].twin = None;
        }
    }
    Ok(dense_id)
}

/// Build the directed-edge map and reject faces that repeat a directed
/// edge within their own ring.
fn build_edge_map(
    arena: &Arena,
    face_ids: &[FaceId],
) -> Result<HashMap<EdgeKey, Vec<HalfEdgeId>>, StitchError> {
    let mut map: HashMap<EdgeKey, Vec<HalfEdgeId>> = HashMap::new();
    for &f in face_ids {
        let mut seen_in_face: HashSet<EdgeKey> = HashSet::new();
        for he in arena.loop_half_edges(arena.faces[f].first_edge) {
            let key = (arena.half_edges[he].origin, arena.half_edge_dest(he));
            if !seen_in_face.insert(key) {
                return Err(StitchError::MalformedFace);
            }
            map.entry(key).or_default().push(he);
        }
    }
    Ok(map)
}

/// Pair every edge key with exactly one half-edge on each side; leave
/// one-sided keys open; collect the rest (multiplicity > 1 on a side, or
/// both sides present but not exactly one-and-one) as complex edges.
fn simple_pairing(
    arena: &mut Arena,
    edge_map: &mut HashMap<EdgeKey, Vec<HalfEdgeId>>,
    dsu: &mut Dsu,
    dense_id: &HashMap<FaceId, usize>,
) -> HashMap<EdgeKey, (Vec<HalfEdgeId>, Vec<HalfEdgeId>)> {
    let mut complex = HashMap::new();
    let keys: Vec<EdgeKey> = edge_map.keys().copied().collect();
    let mut done: HashSet<EdgeKey> = HashSet::new();

    for key in keys {
        if done.contains(&key) {
            continue;
        }
        let rev = (key.1, key.0);
        done.insert(key);
        done.insert(rev);

        let fwd = edge_map.remove(&key).unwrap_or_default();
        let back = edge_map.remove(&rev).unwrap_or_default();

        match (fwd.len(), back.len()) {
            (1, 1) => {
                let (e1, e2) = (fwd[0], back[0]);
                arena.half_edges[e1].twin = Some(e2);
                arena.half_edges[e2].twin = Some(e1);
                let fa = dense_id[&arena.half_edges[e1].face];
                let fb = dense_id[&arena.half_edges[e2].face];
                dsu.union(fa, fb);
            }
            (_, 0) if !fwd.is_empty() => {
                // open: half-edges in `fwd` have no twin, twin stays None.
            }
            (0, _) if !back.is_empty() => {
                // open: half-edges in `back` have no twin, twin stays None.
            }
            _ => {
                complex.insert(key, (fwd, back));
            }
        }
    }
    complex
}

/// Resolve complex (3+ way) edges by sorting the half-edges meeting the
/// edge by the angle of their owning face's outward normal around the
/// edge direction, then pairing adjacent opposite-orientation entries in
/// that cyclic order. Half-edges that don't find an adjacent
/// opposite-orientation neighbour stay open — an edge shared by an odd
/// number of single-sided faces cannot be fully paired by construction,
/// since a twin link is always one-to-one.
fn resolve_complex_edges(
    arena: &mut Arena,
    complex: HashMap<EdgeKey, (Vec<HalfEdgeId>, Vec<HalfEdgeId>)>,
    dsu: &mut Dsu,
    dense_id: &HashMap<FaceId, usize>,
    tol: &Tolerances,
) {
    for ((a, b), (fwd, rev)) in complex {
        let pa = arena.vertices[a].point;
        let pb = arena.vertices[b].point;
        let Some(edge_dir) = (pb - pa).try_normalize(tol.degenerate_normal) else {
            continue;
        };

        let n0 = arena.faces[arena.half_edges[fwd[0]].face].plane.normal;
        let Some(base_dir) = (n0 - edge_dir * n0.dot(&edge_dir)).try_normalize(tol.degenerate_normal) else {
            continue;
        };
        let perp_dir = edge_dir.cross(&base_dir);

        struct Entry {
            he: HalfEdgeId,
            reversed: bool,
            angle: f64,
            comp: usize,
        }

        let angle_of = |arena: &Arena, he: HalfEdgeId, reversed: bool| -> f64 {
            let face = arena.half_edges[he].face;
            let n = arena.faces[face].plane.normal;
            let n = if reversed { -n } else { n };
            let raw = n.dot(&perp_dir).atan2(n.dot(&base_dir));
            if raw < 0.0 {
                raw + std::f64::consts::TAU
            } else {
                raw
            }
        };

        let mut entries: Vec<Entry> = Vec::with_capacity(fwd.len() + rev.len());
        for &he in &fwd {
            let face = arena.half_edges[he].face;
            entries.push(Entry {
                he,
                reversed: false,
                angle: angle_of(arena, he, false),
                comp: dsu.find(dense_id[&face]),
            });
        }
        for &he in &rev {
            let face = arena.half_edges[he].face;
            entries.push(Entry {
                he,
                reversed: true,
                angle: angle_of(arena, he, true),
                comp: dsu.find(dense_id[&face]),
            });
        }

        entries.sort_by(|x, y| {
            x.angle
                .partial_cmp(&y.angle)
                .unwrap()
                .then_with(|| y.reversed.cmp(&x.reversed))
                .then_with(|| x.comp.cmp(&y.comp))
        });

        let n = entries.len();
        let mut paired = vec![false; n];
        for i in 0..n {
            if paired[i] {
                continue;
            }
            let j = (i + 1) % n;
            if j != i && !paired[j] && entries[j].reversed != entries[i].reversed {
                let (he_i, he_j) = (entries[i].he, entries[j].he);
                arena.half_edges[he_i].twin = Some(he_j);
                arena.half_edges[he_j].twin = Some(he_i);
                let fi = dense_id[&arena.half_edges[he_i].face];
                let fj = dense_id[&arena.half_edges[he_j].face];
                dsu.union(fi, fj);
                paired[i] = true;
                paired[j] = true;
            }
        }
    }
}

/// Extract boundary chains from whatever half-edges are still open after
/// simple and complex pairing, and patch the ones that bound a planar
/// T-junction hole rather than a legitimate open boundary.
///
/// A plain open boundary (every vertex on it touched by exactly one open
/// in-edge and one open out-edge, e.g. an open box's rim) is left alone.
/// A junction vertex — one touched by more than two open half-edges,
/// which happens when a finer-subdivided region's boundary meets a
/// single coarser edge — triggers an attempt to walk the smallest cycle
/// through it and synthesize a patch face for that cycle, immediately
/// pairing the patch's ring against the cycle's original half-edges.
/// Bounded to one patch per junction found per pass; reruns until no
/// junction remains or a candidate cycle fails to close or isn't planar.
fn handle_open_chains(
    arena: &mut Arena,
    all_faces: &mut Vec<FaceId>,
    dense_id: &mut HashMap<FaceId, usize>,
    dsu: &mut Dsu,
    tol: &Tolerances,
) {
    loop {
        let open_hes: Vec<HalfEdgeId> = all_faces
            .iter()
            .flat_map(|&f| arena.loop_half_edges(arena.faces[f].first_edge).collect::<Vec<_>>())
            .filter(|&he| arena.half_edges[he].twin.is_none())
            .collect();
        if open_hes.is_empty() {
            return;
        }

        let mut degree: HashMap<VertexId, usize> = HashMap::new();
        for &he in &open_hes {
            *degree.entry(arena.half_edges[he].origin).or_insert(0) += 1;
            *degree.entry(arena.half_edge_dest(he)).or_insert(0) += 1;
        }

        let Some(start_v) = open_hes.iter().find_map(|&he| {
            let v = arena.half_edges[he].origin;
            (degree.get(&v).copied().unwrap_or(0) > 2).then_some(v)
        }) else {
            return; // remaining open half-edges are ordinary boundary; leave them
        };

        let mut cycle = Vec::new();
        let mut current = start_v;
        let mut visited = HashSet::new();
        loop {
            let mut candidates: Vec<HalfEdgeId> = open_hes
                .iter()
                .copied()
                .filter(|&he| arena.half_edges[he].origin == current && !visited.contains(&he))
                .collect();
            candidates.sort_by_key(|he| he.data().as_ffi());
            let Some(&he) = candidates.first() else {
                break;
            };
            visited.insert(he);
            cycle.push(he);
            current = arena.half_edge_dest(he);
            if current == start_v {
                break;
            }
        }

        if cycle.len() < 3 || current != start_v {
            return; // couldn't close a cycle here; don't spin on an irregular graph
        }

        let verts: Vec<VertexId> = cycle.iter().map(|&he| arena.half_edges[he].origin).collect();
        let points: Vec<_> = verts.iter().map(|&v| arena.vertices[v].point).collect();
        if !is_planar_enough(&points, tol) {
            return;
        }

        let mut patch_verts = verts.clone();
        patch_verts.reverse();
        let Ok(patch_face) = arena.make_face(&patch_verts) else {
            return;
        };

        let patch_ring: Vec<HalfEdgeId> = arena
            .loop_half_edges(arena.faces[patch_face].first_edge)
            .collect();
        let n = cycle.len();
        let patch_id = dsu.push();
        dense_id.insert(patch_face, patch_id);
        for i in 0..n {
            let original = cycle[(2 * n - 2 - i) % n];
            let patch_he = patch_ring[i];
            arena.half_edges[original].twin = Some(patch_he);
            arena.half_edges[patch_he].twin = Some(original);
            let owner = dense_id[&arena.half_edges[original].face];
            dsu.union(patch_id, owner);
        }
        all_faces.push(patch_face);
    }
}

fn is_planar_enough(points: &[weld_math::Point3], tol: &Tolerances) -> bool {
    let Some(plane) = Plane::fit_newell(points) else {
        return false;
    };
    points
        .iter()
        .all(|p| plane.signed_distance(p).abs() <= tol.planarity.max(1e-9))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_math::Point3;

    /// A rectangular "vane" hinged on the shared edge `a`-`b` (both at
    /// x=y=0, z=0 and z=1), fanning outward at angle `deg` around the Z
    /// axis. `reversed` controls whether the vane's ring visits the
    /// shared edge as `a -> b` (forward) or `b -> a` (reverse).
    fn vane(arena: &mut Arena, a: VertexId, b: VertexId, deg: f64, reversed: bool) -> FaceId {
        let rad = deg.to_radians();
        let (dx, dy) = (rad.cos(), rad.sin());
        let a_pt = arena.vertices[a].point;
        let b_pt = arena.vertices[b].point;
        let e = arena.add_vertex(Point3::new(a_pt.x + dx, a_pt.y + dy, a_pt.z));
        let c = arena.add_vertex(Point3::new(b_pt.x + dx, b_pt.y + dy, b_pt.z));
        let ring = if reversed {
            [b, a, e, c]
        } else {
            [a, b, c, e]
        };
        arena.make_face(&ring).unwrap()
    }

    #[test]
    fn test_complex_edge_alternating_four_way_forms_two_pairs() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = arena.add_vertex(Point3::new(0.0, 0.0, 1.0));

        let f0 = vane(&mut arena, a, b, 0.0, false);
        let f1 = vane(&mut arena, a, b, 90.0, true);
        let f2 = vane(&mut arena, a, b, 180.0, false);
        let f3 = vane(&mut arena, a, b, 270.0, true);

        let outcome = stitch(&mut arena, &[f0, f1, f2, f3], &Tolerances::default()).unwrap();
        let mut dsu = outcome.dsu;
        let root = |dsu: &mut Dsu, f: FaceId| dsu.find(outcome.dense_id[&f]);

        assert_eq!(root(&mut dsu, f0), root(&mut dsu, f1));
        assert_eq!(root(&mut dsu, f2), root(&mut dsu, f3));
        assert_ne!(root(&mut dsu, f0), root(&mut dsu, f2));
    }

    #[test]
    fn test_complex_edge_odd_three_way_leaves_one_open() {
        let mut arena = Arena::new();
        let a = arena.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = arena.add_vertex(Point3::new(0.0, 0.0, 1.0));

        let f0 = vane(&mut arena, a, b, 0.0, false);
        let f1 = vane(&mut arena, a, b, 120.0, false);
        let f2 = vane(&mut arena, a, b, 240.0, true);

        let outcome = stitch(&mut arena, &[f0, f1, f2], &Tolerances::default()).unwrap();
        let mut dsu = outcome.dsu;
        let root = |dsu: &mut Dsu, f: FaceId| dsu.find(outcome.dense_id[&f]);

        assert_eq!(root(&mut dsu, f1), root(&mut dsu, f2));
        assert_ne!(root(&mut dsu, f0), root(&mut dsu, f1));

        // f0's half-edge along a->b never found an opposite-orientation
        // neighbour, so it stays open.
        let f0_ab = arena
            .loop_half_edges(arena.faces[f0].first_edge)
            .find(|&he| arena.half_edges[he].origin == a && arena.half_edge_dest(he) == b)
            .unwrap();
        assert!(arena.half_edges[f0_ab].twin.is_none());
    }

    #[test]
    fn test_malformed_face_rejects_repeated_directed_edge() {
        let mut arena = Arena::new();
        let v0 = arena.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = arena.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = arena.add_vertex(Point3::new(1.0, 1.0, 0.0));
        // Ring [v0, v1, v2, v0, v1] visits the directed edge v0->v1 twice.
        let face = arena.make_face(&[v0, v1, v2, v0, v1]).unwrap();
        let err = stitch(&mut arena, &[face], &Tolerances::default()).unwrap_err();
        assert_eq!(err, StitchError::MalformedFace);
    }

    #[test]
    fn test_precondition_violated_on_already_stitched_face() {
        let mut arena = Arena::new();
        let v0 = arena.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = arena.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = arena.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let face = arena.make_face(&[v0, v1, v2]).unwrap();
        stitch(&mut arena, &[face], &Tolerances::default()).unwrap();
        let err = stitch(&mut arena, &[face], &Tolerances::default()).unwrap_err();
        assert!(matches!(err, StitchError::PreconditionViolated(_)));
    }
}
