use serde::{Deserialize, Serialize};

/// labels a [`super::Vertex`] by its degree, per spec.md §4.6.
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub enum VertexClass {
    /// degree 1
    Endpoint,
    /// degree 2
    Connector,
    /// degree >= 3
    Intersection,
}

impl VertexClass {
    /// classify a vertex purely from its degree. degree 0 has no
    /// classification under this scheme; callers are expected to have
    /// already dropped degree-0 vertices per spec.md §7 (topology anomaly).
    pub fn from_degree(degree: usize) -> Option<VertexClass> {
        match degree {
            0 => None,
            1 => Some(VertexClass::Endpoint),
            2 => Some(VertexClass::Connector),
            _ => Some(VertexClass::Intersection),
        }
    }
}

/// an optional recommendation surfaced by the Vertex Classifier's
/// predictions table (spec.md §4.6). Never mutates the graph itself; the
/// Route Enumerator may use it to weight candidate scoring.
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub enum VertexAction {
    KeepAsIs,
    MergeThrough,
    SplitIntoYT,
}
