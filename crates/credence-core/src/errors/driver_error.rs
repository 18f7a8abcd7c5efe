//! Causal driver errors.

use super::error_code::{self, CredenceErrorCode};
use super::{DistributionError, GraphError, NetworkError};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Unknown causal node {node}")]
    UnknownNode { node: String },

    #[error("Unknown driver kind {kind}")]
    UnknownKind { kind: String },

    #[error("Failed to prepare work dir {path}: {message}")]
    WorkDir { path: String, message: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Driver cancelled")]
    Cancelled,
}

impl CredenceErrorCode for DriverError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Graph(e) => e.error_code(),
            Self::Network(e) => e.error_code(),
            Self::Distribution(e) => e.error_code(),
            Self::Cancelled => error_code::CANCELLED,
            _ => error_code::DRIVER_ERROR,
        }
    }
}
