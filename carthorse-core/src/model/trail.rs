use geo::{Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

use super::trail_id::TrailId;

/// how a trail entered the workspace (spec.md §9 Design Notes: a single
/// `Trail` record with a classification field rather than three distinct
/// "raw trail", "split child", "connector" types).
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub enum TrailOrigin {
    Raw,
    SplitChild,
    Connector,
}

/// aggregate elevation statistics computed along a trail's 3D geometry.
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct ElevationProfile {
    pub gain_m: f64,
    pub loss_m: f64,
    pub min_m: f64,
    pub max_m: f64,
    pub avg_m: f64,
}

impl ElevationProfile {
    pub fn compute(z_values: &[f64]) -> Self {
        if z_values.is_empty() {
            return ElevationProfile {
                gain_m: 0.0,
                loss_m: 0.0,
                min_m: 0.0,
                max_m: 0.0,
                avg_m: 0.0,
            };
        }
        let mut gain = 0.0;
        let mut loss = 0.0;
        for pair in z_values.windows(2) {
            let delta = pair[1] - pair[0];
            if delta > 0.0 {
                gain += delta;
            } else {
                loss += -delta;
            }
        }
        let min_m = z_values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_m = z_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg_m = z_values.iter().sum::<f64>() / z_values.len() as f64;
        ElevationProfile {
            gain_m: gain,
            loss_m: loss,
            min_m,
            max_m,
            avg_m,
        }
    }
}

/// a named 3D polyline, the unit of work for the Preparer, Splitter, and
/// Bridger (spec.md §3).
///
/// `geometry` carries the 2D (longitude, latitude) component; `elevations_m`
/// is a parallel buffer of z-values, one per coordinate, per the Design
/// Notes in spec.md §9.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Trail {
    pub trail_id: TrailId,
    pub external_id: Option<String>,
    pub parent_id: Option<TrailId>,
    pub origin: TrailOrigin,
    pub region_key: String,
    pub name: String,
    pub geometry: LineString<f64>,
    pub elevations_m: Vec<f64>,
    pub length_km: f64,
    pub elevation: ElevationProfile,
}

impl Trail {
    pub fn new(
        trail_id: TrailId,
        region_key: impl Into<String>,
        name: impl Into<String>,
        geometry: LineString<f64>,
        elevations_m: Vec<f64>,
        origin: TrailOrigin,
        parent_id: Option<TrailId>,
        external_id: Option<String>,
    ) -> Self {
        let length_km = crate::util::geo::haversine::linestring_length_km(&geometry);
        let elevation = ElevationProfile::compute(&elevations_m);
        Trail {
            trail_id,
            external_id,
            parent_id,
            origin,
            region_key: region_key.into(),
            name: name.into(),
            geometry,
            elevations_m,
            length_km,
            elevation,
        }
    }

    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        use geo::BoundingRect;
        self.geometry.bounding_rect()
    }

    pub fn start(&self) -> Coord<f64> {
        self.geometry.0[0]
    }

    pub fn end(&self) -> Coord<f64> {
        self.geometry.0[self.geometry.0.len() - 1]
    }

    pub fn n_points(&self) -> usize {
        self.geometry.0.len()
    }

    /// a trail is closed if its start and end lie within `tolerance_m`
    /// meters of one another (used by the Loop-Splitting Helper, spec.md
    /// §4.8).
    pub fn is_closed(&self, tolerance_m: f64) -> bool {
        let Ok(distance_m) =
            crate::util::geo::haversine::coord_distance_meters(self.start(), self.end())
        else {
            return false;
        };
        distance_m <= tolerance_m
    }
}
