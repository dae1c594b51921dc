use std::collections::HashSet;

use itertools::Itertools;

use crate::model::network::{EdgeId, Graph, VertexId};
use crate::model::units::Cost;

use super::super::dijkstra::{self, SearchExclusions};
use super::super::edge_traversal::EdgeTraversal;
use super::super::search_error::SearchError;

/// an implementation of Yen's k-shortest-loopless-paths algorithm.
///
/// Yen, Jin Y. "Finding the k shortest loopless paths in a network."
/// Management Science 17.11 (1971): 712-716.
///
/// Used by the Route Enumerator (spec.md §4.7) to find up to `k`
/// alternative return paths for a loop or out-and-back candidate, so the
/// pair with minimum edge overlap against the outbound path can be chosen.
pub fn run(
    graph: &Graph,
    source: VertexId,
    target: VertexId,
    k: usize,
) -> Result<Vec<Vec<EdgeTraversal>>, SearchError> {
    let shortest = dijkstra::shortest_path(graph, source, target, &SearchExclusions::default())?;
    if shortest.is_empty() && source != target {
        return Ok(Vec::new());
    }
    let mut accepted: Vec<Vec<EdgeTraversal>> = vec![shortest];

    while accepted.len() < k {
        let prev_accepted_path = match accepted.last() {
            Some(p) if p.len() >= 2 => p.clone(),
            _ => break,
        };

        let mut best_candidate: Option<(Vec<EdgeTraversal>, Cost)> = None;

        for spur_idx in 0..prev_accepted_path.len() - 1 {
            let spur_len = spur_idx + 1;
            let root_path = prev_accepted_path[..spur_len].to_vec();
            let spur_edge = &root_path[root_path.len() - 1];
            let spur_vertex = graph.get_edge(&spur_edge.edge_id)?.target;

            let mut cut_edges: HashSet<EdgeId> = HashSet::new();
            for accepted_path in accepted.iter() {
                if accepted_path.len() > spur_idx
                    && path_prefix_matches(accepted_path, &root_path, spur_len)
                {
                    if let Some(next) = accepted_path.get(spur_idx) {
                        cut_edges.insert(next.edge_id);
                    }
                }
            }
            let root_path_vertices: HashSet<VertexId> = root_path[..root_path.len() - 1]
                .iter()
                .map(|e| graph.get_edge(&e.edge_id).map(|edge| edge.source))
                .collect::<Result<_, _>>()?;

            let exclusions = SearchExclusions {
                edges: cut_edges,
                vertices: root_path_vertices,
            };

            let spur_path = match dijkstra::shortest_path(graph, spur_vertex, target, &exclusions)
            {
                Ok(p) if !p.is_empty() || spur_vertex == target => p,
                _ => continue,
            };

            let candidate: Vec<EdgeTraversal> = root_path[..root_path.len() - 1]
                .iter()
                .cloned()
                .chain(std::iter::once(spur_edge.clone()))
                .chain(spur_path)
                .collect_vec();

            if accepted.iter().any(|a| same_path(a, &candidate)) {
                continue;
            }

            let candidate_cost: Cost = candidate.iter().map(|e| e.cost).sum();
            match &best_candidate {
                Some((_, best_cost)) if candidate_cost >= *best_cost => {}
                _ => best_candidate = Some((candidate, candidate_cost)),
            }
        }

        match best_candidate {
            Some((path, _)) => accepted.push(path),
            None => break,
        }
    }

    Ok(accepted)
}

fn path_prefix_matches(path: &[EdgeTraversal], prefix: &[EdgeTraversal], len: usize) -> bool {
    if path.len() < len {
        return false;
    }
    path[..len]
        .iter()
        .zip(prefix.iter())
        .all(|(a, b)| a.edge_id == b.edge_id)
}

fn same_path(a: &[EdgeTraversal], b: &[EdgeTraversal]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.edge_id == y.edge_id)
}
