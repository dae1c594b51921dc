use thiserror::Error;

use crate::algorithm::search::SearchError;
use crate::model::network::NetworkError;

/// the stage a [`PipelineError`] originated in, carried so the pipeline
/// runner can report which stage failed and roll back to its pre-stage
/// state (spec.md §7 Propagation).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Preparer,
    LoopSplitter,
    IntersectionResolver,
    Splitter,
    Bridger,
    Noder,
    VertexClassifier,
    RouteEnumerator,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Preparer => "preparer",
            Stage::LoopSplitter => "loop-splitting helper",
            Stage::IntersectionResolver => "intersection resolver",
            Stage::Splitter => "splitter",
            Stage::Bridger => "bridger",
            Stage::Noder => "noder & topology builder",
            Stage::VertexClassifier => "vertex classifier",
            Stage::RouteEnumerator => "route enumerator",
        };
        write!(f, "{name}")
    }
}

/// the error taxonomy of spec.md §7: input errors and tolerance
/// violations are recovered locally by the stage that raises them
/// (dropped/logged, never bubbled); everything else bubbles up as a
/// stage-scoped fatal error.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("[{stage}] topology anomaly: {message}")]
    TopologyAnomaly { stage: Stage, message: String },

    #[error("[{stage}] resource error after exhausting retries: {message}")]
    ResourceError { stage: Stage, message: String },

    #[error("[{stage}] contract violation: workspace is not in the expected state: {message}")]
    ContractViolation { stage: Stage, message: String },

    #[error("[{stage}] stage deadline exceeded")]
    DeadlineExceeded { stage: Stage },

    #[error("[{stage}] graph error: {source}")]
    NetworkFailure {
        stage: Stage,
        #[source]
        source: NetworkError,
    },

    #[error("[{stage}] search error: {source}")]
    SearchFailure {
        stage: Stage,
        #[source]
        source: SearchError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::TopologyAnomaly { stage, .. }
            | PipelineError::ResourceError { stage, .. }
            | PipelineError::ContractViolation { stage, .. }
            | PipelineError::DeadlineExceeded { stage }
            | PipelineError::NetworkFailure { stage, .. }
            | PipelineError::SearchFailure { stage, .. } => *stage,
        }
    }
}
