//! Meta-network errors: addressing causal nodes inside a compiled network.

use super::error_code::{self, CredenceErrorCode};
use super::{CompileError, SolverError};

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Node {node} is not a causal node (graph has {size} nodes)")]
    NodeOutOfRange { node: usize, size: usize },

    #[error("Observation time {time} exceeds meta-network horizon {horizon}")]
    TimeOutOfRange { time: usize, horizon: usize },

    #[error("Id {id} is not a distribution node ({count} distributions)")]
    NotAParameter { id: usize, count: usize },

    #[error("Meta-network {name}: inference has been activated, no observation")]
    AlreadyActivated { name: String },

    #[error("Meta-network {name} has been released")]
    Released { name: String },

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

impl CredenceErrorCode for NetworkError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Compile(e) => e.error_code(),
            Self::Solver(e) => e.error_code(),
            _ => error_code::NETWORK_ERROR,
        }
    }
}
