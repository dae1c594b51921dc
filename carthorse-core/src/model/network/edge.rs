use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::model::trail_id::TrailId;
use crate::util::geo::haversine::linestring_length_km;

use super::{EdgeId, VertexId};

/// a single routable segment, produced by the Noder & Topology Builder by
/// cutting a [`crate::model::trail::Trail`] at every vertex it passes
/// through (spec.md §4.5).
///
/// `geometry` and `elevations_m` are parallel buffers: `elevations_m[i]`
/// is the elevation of `geometry.0[i]`, per the Design Notes in spec.md §9.
/// They are kept separate rather than folded into a 3D coordinate so the
/// planar topology code can stay oblivious to elevation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub edge_id: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
    pub geometry: LineString<f64>,
    pub elevations_m: Vec<f64>,
    pub length_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub originating_trail_id: TrailId,
    pub originating_trail_name: String,
    pub cost: f64,
    pub reverse_cost: f64,
}

impl Edge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        edge_id: EdgeId,
        source: VertexId,
        target: VertexId,
        geometry: LineString<f64>,
        elevations_m: Vec<f64>,
        originating_trail_id: TrailId,
        originating_trail_name: impl Into<String>,
    ) -> Self {
        let length_km = geometry_length_km(&geometry);
        let (elevation_gain_m, elevation_loss_m) = elevation_gain_loss(&elevations_m);
        Edge {
            edge_id,
            source,
            target,
            geometry,
            elevations_m,
            length_km,
            elevation_gain_m,
            elevation_loss_m,
            originating_trail_id,
            originating_trail_name: originating_trail_name.into(),
            cost: length_km,
            reverse_cost: length_km,
        }
    }

    pub fn endpoints(&self) -> (Coord<f64>, Coord<f64>) {
        let coords = self.geometry.0.as_slice();
        (coords[0], coords[coords.len() - 1])
    }

    pub fn other_endpoint(&self, from: VertexId) -> Option<VertexId> {
        if from == self.source {
            Some(self.target)
        } else if from == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

fn geometry_length_km(geometry: &LineString<f64>) -> f64 {
    linestring_length_km(geometry)
}

fn elevation_gain_loss(elevations_m: &[f64]) -> (f64, f64) {
    let mut gain = 0.0;
    let mut loss = 0.0;
    for window in elevations_m.windows(2) {
        let delta = window[1] - window[0];
        if delta > 0.0 {
            gain += delta;
        } else {
            loss += -delta;
        }
    }
    (gain, loss)
}
