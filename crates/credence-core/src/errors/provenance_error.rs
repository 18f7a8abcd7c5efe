//! Provenance and fact-model errors.

use super::error_code::{self, CredenceErrorCode};

/// Errors raised while building, querying, or dumping a provenance.
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("Malformed tuple text: {input}")]
    MalformedTuple { input: String },

    #[error("Sub tuples and signs differ in length: {tuples} vs {signs}")]
    SignArityMismatch { tuples: usize, signs: usize },

    #[error("Unmet id {id}")]
    UnknownId { id: String },

    #[error("Tuple {tuple} is missing from the clause index")]
    UnknownTuple { tuple: String },

    #[error("Provenance {name} has not been computed yet")]
    NotComputed { name: String },

    #[error("Failed to dump provenance to {path}: {message}")]
    Io { path: String, message: String },
}

impl CredenceErrorCode for ProvenanceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => error_code::IO_ERROR,
            _ => error_code::PROVENANCE_ERROR,
        }
    }
}
