//! Top-level error aggregating every subsystem.

use super::error_code::CredenceErrorCode;
use super::{
    CompileError, ConfigError, DistributionError, DriverError, GraphError, NetworkError,
    ProvenanceError, SolverError,
};

/// Errors surfaced at the service boundary.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum CredenceError {
    #[error("Provenance error: {0}")]
    Provenance(#[from] ProvenanceError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CredenceErrorCode for CredenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Provenance(e) => e.error_code(),
            Self::Graph(e) => e.error_code(),
            Self::Distribution(e) => e.error_code(),
            Self::Compile(e) => e.error_code(),
            Self::Solver(e) => e.error_code(),
            Self::Network(e) => e.error_code(),
            Self::Driver(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

pub type CredenceResult<T> = Result<T, CredenceError>;
