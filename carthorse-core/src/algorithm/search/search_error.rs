use crate::model::network::{EdgeId, NetworkError, VertexId};

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("the search failed due to a graph error: {source}")]
    NetworkFailure {
        #[from]
        source: NetworkError,
    },
    #[error("vertex {0} is missing from the search tree")]
    VertexMissingFromSearchTree(VertexId),
    #[error("search result revisits edge {0}, which would form a loop")]
    LoopInSearchResult(EdgeId),
    #[error("no path exists between vertices {0} and {1} after searching {2} edges")]
    NoPathExistsBetweenVertices(VertexId, VertexId, usize),
    #[error("search exceeded its deadline after exploring {0} vertices")]
    Timeout(usize),
    #[error("internal error in search logic: {0}")]
    InternalError(String),
}
