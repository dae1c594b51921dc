use std::collections::HashMap;

use crate::model::network::{VertexAction, VertexClass, VertexId};

use super::context::PipelineContext;
use super::error::Stage;

/// a recommended action for one vertex, surfaced for the Route Enumerator's
/// scoring but never applied to the graph directly (spec.md §4.6).
pub type Predictions = HashMap<VertexId, VertexAction>;

#[derive(Default, Debug, Clone, Copy)]
pub struct ClassifierReport {
    pub endpoints: usize,
    pub connectors: usize,
    pub intersections: usize,
    pub merge_through_recommended: usize,
}

/// labels every vertex by degree (already computed by [`Graph::build`]) and
/// produces an optional predictions table recommending connector vertices
/// safe to dissolve.
pub fn run(ctx: &mut PipelineContext) -> ClassifierReport {
    ctx.log_stage_start(Stage::VertexClassifier);
    let mut report = ClassifierReport::default();
    let Some(graph) = ctx.workspace.graph() else {
        return report;
    };

    let mut predictions = Predictions::new();
    for vertex in graph.vertices_iter() {
        match vertex.classification {
            Some(VertexClass::Endpoint) => report.endpoints += 1,
            Some(VertexClass::Connector) => {
                report.connectors += 1;
                if is_safe_to_dissolve(graph, vertex.vertex_id) {
                    predictions.insert(vertex.vertex_id, VertexAction::MergeThrough);
                    report.merge_through_recommended += 1;
                } else {
                    predictions.insert(vertex.vertex_id, VertexAction::KeepAsIs);
                }
            }
            Some(VertexClass::Intersection) => report.intersections += 1,
            None => {}
        }
    }

    ctx.set_vertex_predictions(predictions);
    report
}

/// a degree-2 vertex is safe to dissolve (fold its two incident edges into
/// one) only if it doesn't join edges from different originating trails,
/// so dissolving never hides a trail-name change at a route anchor.
fn is_safe_to_dissolve(graph: &crate::model::network::Graph, vertex_id: VertexId) -> bool {
    let incident = graph.incident_edges(&vertex_id);
    if incident.len() != 2 {
        return false;
    }
    let names: Vec<&str> = incident
        .iter()
        .filter_map(|(edge_id, _)| graph.get_edge(edge_id).ok())
        .map(|edge| edge.originating_trail_name.as_str())
        .collect();
    names.len() == 2 && names[0] == names[1]
}
