use std::fmt::Display;

use geo::Coord;
use serde::{Deserialize, Serialize};

use super::{classification::VertexClass, VertexId};

/// a planar-noded point of the routable graph (spec.md §3).
///
/// `degree` and `classification` are maintained by the Noder and Vertex
/// Classifier respectively; they are not recomputed lazily so that
/// invariant 5 (degree consistency, spec.md §8) can be checked directly
/// against the stored value.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Vertex {
    pub vertex_id: VertexId,
    pub coordinate: Coord<f64>,
    pub elevation_m: f64,
    pub degree: usize,
    pub classification: Option<VertexClass>,
}

impl Vertex {
    pub fn new(vertex_id: usize, x: f64, y: f64, elevation_m: f64) -> Self {
        Self {
            vertex_id: VertexId(vertex_id),
            coordinate: Coord { x, y },
            elevation_m,
            degree: 0,
            classification: None,
        }
    }

    pub fn x(&self) -> f64 {
        self.coordinate.x
    }

    pub fn y(&self) -> f64 {
        self.coordinate.y
    }
}

impl Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Vertex {} ({}, {}, deg={})",
            self.vertex_id,
            self.x(),
            self.y(),
            self.degree
        )
    }
}
