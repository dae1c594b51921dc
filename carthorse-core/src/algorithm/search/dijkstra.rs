use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::model::network::{EdgeId, Graph, VertexId};
use crate::model::units::Cost;
use crate::util::priority_queue::InternalPriorityQueue;

use super::edge_traversal::EdgeTraversal;
use super::search_error::SearchError;
use super::search_tree::{SearchTree, SearchTreeBranch};

/// edges and vertices a search is forbidden to use, the mechanism Yen's
/// algorithm uses to force alternative paths (spec.md §4.7).
#[derive(Default, Clone)]
pub struct SearchExclusions {
    pub edges: HashSet<EdgeId>,
    pub vertices: HashSet<VertexId>,
}

/// runs a single-source shortest path search over `graph`, stopping early
/// if `target` is reached. Edge cost is always the edge's `cost` field
/// (length in km); the network is undirected so every incident edge is a
/// valid next step.
pub fn run(
    graph: &Graph,
    source: VertexId,
    target: Option<VertexId>,
    exclusions: &SearchExclusions,
) -> Result<SearchTree, SearchError> {
    if Some(source) == target {
        return Ok(SearchTree::new());
    }

    let mut frontier: InternalPriorityQueue<VertexId, Reverse<Cost>> =
        InternalPriorityQueue::default();
    let mut best_cost: HashMap<VertexId, Cost> = HashMap::new();
    let mut tree: SearchTree = SearchTree::new();

    best_cost.insert(source, Cost::ZERO);
    frontier.push(source, Reverse(Cost::ZERO));

    let mut visited: HashSet<VertexId> = HashSet::new();

    while let Some((current, Reverse(current_cost))) = frontier.pop() {
        if visited.contains(&current) {
            continue;
        }
        visited.insert(current);

        if Some(current) == target {
            break;
        }

        for (edge_id, terminal_vertex) in graph.incident_edges(&current) {
            if exclusions.edges.contains(&edge_id) || exclusions.vertices.contains(&terminal_vertex)
            {
                continue;
            }
            if visited.contains(&terminal_vertex) {
                continue;
            }
            let edge = graph.get_edge(&edge_id)?;
            let tentative = current_cost + Cost::new(edge.cost);
            let existing = best_cost.get(&terminal_vertex).copied().unwrap_or(Cost::INFINITY);
            if tentative < existing {
                best_cost.insert(terminal_vertex, tentative);
                tree.insert(
                    terminal_vertex,
                    SearchTreeBranch {
                        terminal_vertex: current,
                        edge_traversal: EdgeTraversal::new(edge_id, Cost::new(edge.cost)),
                    },
                );
                frontier.push(terminal_vertex, Reverse(tentative));
            }
        }
    }

    Ok(tree)
}

/// convenience wrapper: run a search and immediately backtrack the path
/// from `source` to `target`, or error if none exists.
pub fn shortest_path(
    graph: &Graph,
    source: VertexId,
    target: VertexId,
    exclusions: &SearchExclusions,
) -> Result<Vec<EdgeTraversal>, SearchError> {
    let tree = run(graph, source, Some(target), exclusions)?;
    super::search_tree::vertex_oriented_route(source, target, &tree)
}
