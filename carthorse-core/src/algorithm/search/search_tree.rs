use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use serde::Serialize;

use crate::model::network::{EdgeId, VertexId};

use super::edge_traversal::EdgeTraversal;
use super::search_error::SearchError;

/// one branch of a shortest-path tree: the edge taken to leave this vertex
/// and the vertex it lands on, read backward from a search target toward
/// its source.
#[derive(Clone, Debug, Serialize)]
pub struct SearchTreeBranch {
    pub terminal_vertex: VertexId,
    pub edge_traversal: EdgeTraversal,
}

impl Display for SearchTreeBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "-[edge:{} cost:{}]-> ({})",
            self.edge_traversal.edge_id, self.edge_traversal.cost, self.terminal_vertex
        )
    }
}

pub type SearchTree = HashMap<VertexId, SearchTreeBranch>;

/// reconstructs a path from a shortest-path tree for some source and
/// target vertex. directionality travels up from target to source, toward
/// the root of the tree.
pub fn vertex_oriented_route(
    source_id: VertexId,
    target_id: VertexId,
    tree: &SearchTree,
) -> Result<Vec<EdgeTraversal>, SearchError> {
    let mut result: Vec<EdgeTraversal> = vec![];
    let mut visited: HashSet<EdgeId> = HashSet::new();
    let mut this_vertex = target_id;
    loop {
        if this_vertex == source_id {
            break;
        }
        let branch = tree
            .get(&this_vertex)
            .ok_or(SearchError::VertexMissingFromSearchTree(this_vertex))?;
        let first_visit = visited.insert(branch.edge_traversal.edge_id);
        if !first_visit {
            return Err(SearchError::LoopInSearchResult(
                branch.edge_traversal.edge_id,
            ));
        }
        result.push(branch.edge_traversal.clone());
        this_vertex = branch.terminal_vertex;
    }
    result.reverse();
    Ok(result)
}
