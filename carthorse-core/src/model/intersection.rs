use geo::Coord;
use serde::{Deserialize, Serialize};

use super::trail_id::TrailId;

/// how a pair of trails relate at a detected intersection (spec.md §4.2).
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub enum IntersectionClass {
    TrueCrossing,
    EndpointOnTrail,
    EndpointNearMiss,
    MultiPointCrossing,
}

/// an ephemeral record emitted by the Intersection Resolver, consumed by
/// the Splitter and (for near-misses) the Bridger (spec.md §3). Never
/// persisted past the resolver stage.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct IntersectionCandidate {
    pub trail_a: TrailId,
    pub trail_b: TrailId,
    pub points: Vec<Coord<f64>>,
    pub classification: IntersectionClass,
    pub min_distance_m: f64,
}

impl IntersectionCandidate {
    pub fn new(
        trail_a: TrailId,
        trail_b: TrailId,
        points: Vec<Coord<f64>>,
        classification: IntersectionClass,
        min_distance_m: f64,
    ) -> Self {
        IntersectionCandidate {
            trail_a,
            trail_b,
            points,
            classification,
            min_distance_m,
        }
    }

    pub fn is_near_miss(&self) -> bool {
        matches!(self.classification, IntersectionClass::EndpointNearMiss)
    }
}

/// a single (arc-length position, 3D point) split instruction produced for
/// one trail by the Intersection Resolver (spec.md §4.2 Output) or the
/// Loop-Splitting Helper (spec.md §4.8).
#[derive(Copy, Clone, Serialize, Deserialize, Debug)]
pub struct SplitInstruction {
    pub arc_length_km: f64,
    pub point: Coord<f64>,
    pub elevation_m: f64,
}

impl SplitInstruction {
    pub fn new(arc_length_km: f64, point: Coord<f64>, elevation_m: f64) -> Self {
        SplitInstruction {
            arc_length_km,
            point,
            elevation_m,
        }
    }
}
