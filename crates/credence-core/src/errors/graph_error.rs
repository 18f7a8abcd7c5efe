//! Causal graph construction errors.

use super::error_code::{self, CredenceErrorCode};

/// Structural invariant violations of a causal graph.
///
/// Every node must carry exactly one role and every reference must
/// resolve; anything else yields a distinguishable variant here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("unmet singleton {node}")]
    UnmetSingleton { node: String },

    #[error("unmet head {node}")]
    UnmetHead { node: String },

    #[error("unmet sub {sub} in head {head}")]
    UnmetSub { head: String, sub: String },

    #[error("ill-formed, head {head} exists in bodies")]
    SelfReference { head: String },

    #[error("overlapped node {node}")]
    OverlappedNode { node: String },

    #[error("redundant node {node}")]
    RedundantNode { node: String },

    #[error("node id {id} outside graph of {size} nodes")]
    NodeOutOfRange { id: usize, size: usize },

    #[error("distribution id {id} outside {size} distributions")]
    DistOutOfRange { id: usize, size: usize },
}

impl CredenceErrorCode for GraphError {
    fn error_code(&self) -> &'static str {
        error_code::GRAPH_ERROR
    }
}
