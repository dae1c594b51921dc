use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// stable identity of a source trail, carried through splitting and noding
/// so that every derived [`super::network::Edge`] can be traced back to the
/// polyline it came from (spec.md §3).
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct TrailId(pub Uuid);

impl TrailId {
    pub fn new() -> Self {
        TrailId(Uuid::new_v4())
    }
}

impl Default for TrailId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TrailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TrailId {
    fn from(value: Uuid) -> Self {
        TrailId(value)
    }
}
