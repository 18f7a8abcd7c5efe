//! Discrete distribution errors.

use super::error_code::{self, CredenceErrorCode};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    #[error("Support value {value} out of range [0,1]")]
    SupportOutOfRange { value: f64 },

    #[error("Distribution needs at least one support value")]
    EmptySupport,

    #[error("Expected {expected} weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("Weights must be finite, non-negative, and sum above zero")]
    ZeroMass,
}

impl CredenceErrorCode for DistributionError {
    fn error_code(&self) -> &'static str {
        error_code::DISTRIBUTION_ERROR
    }
}
