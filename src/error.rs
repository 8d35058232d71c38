//! Error types shared by axioms, combinators and the reranker.

use crate::cache::CacheError;
use crate::estimator::EstimatorError;
use crate::rerank::TraceError;

/// Boxed error raised by an external collaborator of a leaf axiom.
pub type ExternalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for axiom evaluation.
///
/// Combinators never catch these: a child error surfaces unchanged to the
/// caller of the outermost axiom.
#[derive(Debug, thiserror::Error)]
pub enum AxiomError {
    /// Two distinct outputs were judged equal while partitioning around a pivot.
    #[error("tie between output {vertex} and pivot {pivot}: axiom must decide every distinct pair")]
    Tie { vertex: usize, pivot: usize },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unsupported output: {0}")]
    Unsupported(String),
    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),
    #[error("external error: {0}")]
    External(ExternalError),
}

impl AxiomError {
    pub fn external(err: impl Into<ExternalError>) -> Self {
        Self::External(err.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
