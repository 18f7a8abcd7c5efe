//! Solver backend errors.

use super::error_code::{self, CredenceErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Variable {var} is not part of the network ({count} variables)")]
    VariableOutOfRange { var: usize, count: usize },

    #[error("Factor {factor} is not part of the network ({count} factors)")]
    FactorOutOfRange { factor: usize, count: usize },

    #[error("Intermediate table of {entries} entries exceeds limit {limit}")]
    TableTooLarge { entries: usize, limit: usize },

    #[error("Evidence has zero probability under the network")]
    InconsistentEvidence,
}

impl CredenceErrorCode for SolverError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::IO_ERROR,
            Self::InconsistentEvidence => error_code::INCONSISTENT_EVIDENCE,
            _ => error_code::SOLVER_ERROR,
        }
    }
}
