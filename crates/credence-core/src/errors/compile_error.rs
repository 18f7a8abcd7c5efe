//! Factor-graph compilation errors.

use super::error_code::{self, CredenceErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Clause limit must be between 2 and 62, got {limit}")]
    InvalidClauseLimit { limit: usize },

    #[error("Stochastic node {node} refers to missing distribution {dist}")]
    MissingDistribution { node: usize, dist: usize },

    #[error("Failed to write {path}: {message}")]
    Io { path: String, message: String },
}

impl CredenceErrorCode for CompileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::IO_ERROR,
            _ => error_code::COMPILE_ERROR,
        }
    }
}
