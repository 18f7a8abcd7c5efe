//! Factor-graph compiler configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompilerConfig {
    /// Maximum variables per boolean factor before phony decomposition. Default: 4.
    pub clause_limit: Option<usize>,
    /// Write `.causal.graph` / `.priors.list` debug artifacts. Default: false.
    pub dump_artifacts: Option<bool>,
}

impl CompilerConfig {
    pub fn effective_clause_limit(&self) -> usize {
        self.clause_limit.unwrap_or(constants::DEFAULT_CLAUSE_LIMIT)
    }

    pub fn effective_dump_artifacts(&self) -> bool {
        self.dump_artifacts
            .unwrap_or(constants::DEFAULT_DUMP_ARTIFACTS)
    }
}
