use serde::{Deserialize, Serialize};

use crate::model::pattern::RoutePattern;

/// additional spatial filter applied by the Preparer (spec.md §6).
#[derive(Copy, Clone, Serialize, Deserialize, Debug)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

/// the full configuration surface recognized by the core (spec.md §6).
///
/// Built by the CLI from a TOML file and passed into every stage via
/// [`super::context::PipelineContext`] rather than read from process-wide
/// globals (spec.md §9 Design Notes).
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PipelineConfig {
    pub region_key: String,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    pub intersection_tolerance_meters: f64,
    pub bridging_enabled: bool,
    pub bridging_tolerance_meters: f64,
    pub min_segment_length_meters: f64,
    pub min_edge_length_meters: f64,
    pub snap_tolerance_degrees: f64,
    pub simplify_tolerance: f64,
    #[serde(default)]
    pub patterns: Vec<RoutePattern>,
    pub loop_ksp_k: usize,
    pub loop_max_overlap_pct: f64,
    pub min_similarity_score: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            region_key: String::new(),
            bounding_box: None,
            intersection_tolerance_meters: 2.0,
            bridging_enabled: true,
            bridging_tolerance_meters: 20.0,
            min_segment_length_meters: 5.0,
            min_edge_length_meters: 0.1,
            snap_tolerance_degrees: 1e-6,
            simplify_tolerance: 0.0,
            patterns: Vec::new(),
            loop_ksp_k: 6,
            loop_max_overlap_pct: 30.0,
            min_similarity_score: 0.3,
        }
    }
}
