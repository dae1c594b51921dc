use thiserror::Error;

use super::{EdgeId, VertexId};

/// errors raised by [`super::Graph`] lookups and mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("vertex {0} is not present in the graph")]
    VertexNotFound(VertexId),
    #[error("edge {0} is not present in the graph")]
    EdgeNotFound(EdgeId),
    #[error("edge {edge} does not connect to vertex {vertex}")]
    EdgeNotIncident { edge: EdgeId, vertex: VertexId },
}
