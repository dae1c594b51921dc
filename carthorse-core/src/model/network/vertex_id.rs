use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

/// a dense, region-local integer id for a [`super::Vertex`].
///
/// ids are assigned by the Noder in ascending canonical-coordinate order
/// (spec.md §5) so that they are reproducible across runs over the same
/// input.
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Default)]
pub struct VertexId(pub usize);

impl VertexId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl PartialOrd for VertexId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VertexId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<usize> for VertexId {
    fn from(value: usize) -> Self {
        VertexId(value)
    }
}
