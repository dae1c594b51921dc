use std::collections::{HashMap, HashSet};

use crate::model::network::{Graph, VertexId};
use crate::model::units::Cost;

use super::edge_traversal::EdgeTraversal;
use super::search_error::SearchError;

/// enumerates elementary cycles of the network up to a cost cap, following
/// the blocked-vertex strategy of:
///
/// Hawick, K. A., and H. A. James. "Enumerating circuits and loops in
/// graphs with self-arcs and multiple-arcs." FCS. 2008.
///
/// A trail network is undirected, so each edge is treated as two arcs (the
/// "directed doubled graph" of spec.md §4.7); a cycle may never traverse
/// the same edge twice, which rules out the trivial back-and-forth over a
/// single edge. Used by the Route Enumerator's loop search alongside the
/// anchor-based true-loop search.
pub struct HawickCircuits<'g> {
    graph: &'g Graph,
    cost_cap: Cost,
    blocked: HashSet<VertexId>,
    block_map: HashMap<VertexId, HashSet<VertexId>>,
    path: Vec<EdgeTraversal>,
    path_vertices: Vec<VertexId>,
    circuits: Vec<Vec<EdgeTraversal>>,
}

impl<'g> HawickCircuits<'g> {
    pub fn new(graph: &'g Graph, cost_cap: Cost) -> Self {
        HawickCircuits {
            graph,
            cost_cap,
            blocked: HashSet::new(),
            block_map: HashMap::new(),
            path: Vec::new(),
            path_vertices: Vec::new(),
            circuits: Vec::new(),
        }
    }

    /// all elementary circuits passing through `start`, whose vertex id is
    /// the smallest in the circuit (the standard restriction that makes
    /// each circuit get enumerated exactly once across repeated calls with
    /// ascending `start`).
    pub fn circuits_from(mut self, start: VertexId) -> Result<Vec<Vec<EdgeTraversal>>, SearchError> {
        self.blocked.clear();
        self.block_map.clear();
        self.path.clear();
        self.path_vertices.clear();
        self.path_vertices.push(start);
        self.blocked.insert(start);
        self.circuit(start, start)?;
        Ok(std::mem::take(&mut self.circuits))
    }

    fn circuit(&mut self, start: VertexId, current: VertexId) -> Result<bool, SearchError> {
        let mut found = false;
        let current_cost: Cost = self.path.iter().map(|e| e.cost).sum();

        for (edge_id, next) in self.graph.incident_edges(&current) {
            if next.as_usize() < start.as_usize() {
                continue;
            }
            if self.path.iter().any(|e| e.edge_id == edge_id) {
                continue;
            }
            let edge_cost = Cost::new(self.graph.get_edge(&edge_id)?.cost);
            if current_cost + edge_cost > self.cost_cap {
                continue;
            }

            if next == start && self.path.len() >= 2 {
                self.path.push(EdgeTraversal::new(edge_id, edge_cost));
                self.circuits.push(self.path.clone());
                self.path.pop();
                found = true;
            } else if !self.blocked.contains(&next) {
                self.path.push(EdgeTraversal::new(edge_id, edge_cost));
                self.path_vertices.push(next);
                self.blocked.insert(next);

                let got_circuit = self.circuit(start, next)?;
                found = found || got_circuit;

                if got_circuit {
                    self.unblock(next);
                } else {
                    for (other_edge, other_next) in self.graph.incident_edges(&next) {
                        if other_next.as_usize() >= start.as_usize()
                            && !self.path.iter().any(|e| e.edge_id == other_edge)
                        {
                            self.block_map.entry(other_next).or_default().insert(next);
                        }
                    }
                }

                self.path.pop();
                self.path_vertices.pop();
            }
        }

        Ok(found)
    }

    fn unblock(&mut self, vertex: VertexId) {
        self.blocked.remove(&vertex);
        if let Some(dependents) = self.block_map.remove(&vertex) {
            for dependent in dependents {
                if self.blocked.contains(&dependent) {
                    self.unblock(dependent);
                }
            }
        }
    }
}

/// enumerates every elementary circuit in the graph up to `cost_cap`,
/// running the blocked search once per vertex id in ascending order so
/// each circuit is discovered exactly once (at its lowest-id member).
pub fn all_circuits(graph: &Graph, cost_cap: Cost) -> Result<Vec<Vec<EdgeTraversal>>, SearchError> {
    let mut all = Vec::new();
    for start in graph.vertex_ids() {
        let found = HawickCircuits::new(graph, cost_cap).circuits_from(start)?;
        all.extend(found);
    }
    Ok(all)
}

pub fn circuit_cost(graph: &Graph, circuit: &[EdgeTraversal]) -> Result<Cost, SearchError> {
    let mut total = Cost::ZERO;
    for traversal in circuit {
        let _ = graph.get_edge(&traversal.edge_id)?;
        total = total + traversal.cost;
    }
    Ok(total)
}
