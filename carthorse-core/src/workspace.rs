use std::collections::HashMap;

use crate::model::intersection::{IntersectionCandidate, SplitInstruction};
use crate::model::network::Graph;
use crate::model::route::RouteCandidate;
use crate::model::trail::Trail;
use crate::model::trail_id::TrailId;

/// the namespaced, region-scoped set of tables holding the intermediate
/// state of a single pipeline run (spec.md §3 Ownership, §6 Persisted
/// state layout).
///
/// Stands in for the "spatial relational store" of the source system: a
/// real deployment would back this with a database, but the core only
/// needs the table contract, not the storage engine, so this holds
/// everything in memory. Table names mirror spec.md §6: `trails`,
/// `intersection_points`, `noded_edges` (via `graph`), `vertices` (via
/// `graph`), `routes`.
#[derive(Default)]
pub struct Workspace {
    region_tag: String,
    trails: HashMap<TrailId, Trail>,
    intersection_points: Vec<IntersectionCandidate>,
    split_instructions: HashMap<TrailId, Vec<SplitInstruction>>,
    graph: Option<Graph>,
    routes: Vec<RouteCandidate>,
}

impl Workspace {
    pub fn new(region_tag: impl Into<String>) -> Self {
        Workspace {
            region_tag: region_tag.into(),
            ..Default::default()
        }
    }

    pub fn region_tag(&self) -> &str {
        &self.region_tag
    }

    // -- trails table --------------------------------------------------

    pub fn insert_trail(&mut self, trail: Trail) {
        self.trails.insert(trail.trail_id, trail);
    }

    pub fn insert_trails(&mut self, trails: impl IntoIterator<Item = Trail>) {
        for trail in trails {
            self.insert_trail(trail);
        }
    }

    pub fn trail(&self, trail_id: &TrailId) -> Option<&Trail> {
        self.trails.get(trail_id)
    }

    pub fn trails(&self) -> impl Iterator<Item = &Trail> {
        self.trails.values()
    }

    pub fn n_trails(&self) -> usize {
        self.trails.len()
    }

    /// atomically replaces `parent` with `children`, per the Splitter's
    /// replace-with-children transaction (spec.md §4.3, §5).
    pub fn replace_trail(&mut self, parent: TrailId, children: Vec<Trail>) {
        self.trails.remove(&parent);
        self.insert_trails(children);
    }

    pub fn remove_trail(&mut self, trail_id: &TrailId) -> Option<Trail> {
        self.trails.remove(trail_id)
    }

    pub fn replace_all_trails(&mut self, trails: Vec<Trail>) {
        self.trails = trails.into_iter().map(|t| (t.trail_id, t)).collect();
    }

    // -- intersection_points table --------------------------------------

    pub fn set_intersection_points(&mut self, points: Vec<IntersectionCandidate>) {
        self.intersection_points = points;
    }

    pub fn intersection_points(&self) -> &[IntersectionCandidate] {
        &self.intersection_points
    }

    pub fn set_split_instructions(
        &mut self,
        instructions: HashMap<TrailId, Vec<SplitInstruction>>,
    ) {
        self.split_instructions = instructions;
    }

    pub fn split_instructions(&self, trail_id: &TrailId) -> &[SplitInstruction] {
        self.split_instructions
            .get(trail_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_split_instructions(&self) -> &HashMap<TrailId, Vec<SplitInstruction>> {
        &self.split_instructions
    }

    // -- noded_edges / vertices tables -----------------------------------

    pub fn set_graph(&mut self, graph: Graph) {
        self.graph = Some(graph);
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    // -- routes table -----------------------------------------------------

    pub fn set_routes(&mut self, routes: Vec<RouteCandidate>) {
        self.routes = routes;
    }

    pub fn routes(&self) -> &[RouteCandidate] {
        &self.routes
    }
}
