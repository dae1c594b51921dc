use std::fmt::Display;

use serde::Serialize;

use crate::model::network::EdgeId;
use crate::model::units::Cost;

/// a single edge step recorded by a search, carrying the incremental cost
/// of traversing it. Trail networks have no access/traversal cost split or
/// per-vehicle state the way a road network does, so this is simpler than
/// a general traversal record: just the edge and what it cost.
#[derive(Clone, Debug, Serialize)]
pub struct EdgeTraversal {
    pub edge_id: EdgeId,
    pub cost: Cost,
}

impl EdgeTraversal {
    pub fn new(edge_id: EdgeId, cost: Cost) -> Self {
        EdgeTraversal { edge_id, cost }
    }
}

impl Display for EdgeTraversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "edge {} cost:{}", self.edge_id, self.cost)
    }
}
