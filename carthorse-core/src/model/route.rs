use serde::{Deserialize, Serialize};

use super::network::{EdgeId, VertexId};

/// the shape a [`RouteCandidate`] was searched for (spec.md §4.7).
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub enum RouteShape {
    Loop,
    OutAndBack,
    PointToPoint,
}

/// an ordered sequence of edges forming a path, emitted by the Route
/// Enumerator (spec.md §3).
///
/// `edge_ids` is a weak reference by integer id into the graph's edge
/// arena, per the Design Notes in spec.md §9; the candidate itself owns no
/// geometry.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RouteCandidate {
    pub route_id: usize,
    pub shape: RouteShape,
    pub edge_ids: Vec<EdgeId>,
    pub anchor_vertex: VertexId,
    pub total_distance_km: f64,
    pub total_elevation_gain_m: f64,
    pub similarity: f64,
    pub trail_names: Vec<String>,
}

impl RouteCandidate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        route_id: usize,
        shape: RouteShape,
        edge_ids: Vec<EdgeId>,
        anchor_vertex: VertexId,
        total_distance_km: f64,
        total_elevation_gain_m: f64,
        similarity: f64,
        trail_names: Vec<String>,
    ) -> Self {
        RouteCandidate {
            route_id,
            shape,
            edge_ids,
            anchor_vertex,
            total_distance_km,
            total_elevation_gain_m,
            similarity,
            trail_names,
        }
    }

    pub fn start_edge(&self) -> Option<EdgeId> {
        self.edge_ids.first().copied()
    }

    pub fn end_edge(&self) -> Option<EdgeId> {
        self.edge_ids.last().copied()
    }

    /// canonical key used to deduplicate routes that traverse the same
    /// edges up to rotation and reversal (spec.md §4.7). Rotation only
    /// applies to loops, which have no fixed starting edge; point-to-point
    /// and out-and-back routes are compared up to reversal only.
    pub fn canonical_key(&self) -> Vec<EdgeId> {
        if self.edge_ids.is_empty() {
            return Vec::new();
        }
        let mut reversed = self.edge_ids.clone();
        reversed.reverse();
        if self.shape == RouteShape::Loop {
            let forward = canonical_rotation(&self.edge_ids);
            let backward = canonical_rotation(&reversed);
            std::cmp::min(forward, backward)
        } else {
            std::cmp::min(self.edge_ids.clone(), reversed)
        }
    }
}

/// the lexicographically smallest rotation of `ids`, used to make cyclic
/// edge-id sequences comparable regardless of starting point.
fn canonical_rotation(ids: &[EdgeId]) -> Vec<EdgeId> {
    if ids.is_empty() {
        return Vec::new();
    }
    let n = ids.len();
    let min_start = (0..n)
        .min_by_key(|&start| (0..n).map(|i| ids[(start + i) % n]).collect::<Vec<_>>())
        .unwrap_or(0);
    (0..n).map(|i| ids[(min_start + i) % n]).collect()
}
