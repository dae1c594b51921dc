use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

/// a dense, region-local integer id for a [`super::Edge`], assigned in the
/// order edges are emitted by the Noder & Topology Builder.
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug, Default)]
pub struct EdgeId(pub usize);

impl EdgeId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl PartialOrd for EdgeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<usize> for EdgeId {
    fn from(value: usize) -> Self {
        EdgeId(value)
    }
}
