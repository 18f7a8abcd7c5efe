//! Provenance pruning configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration for the provenance builder.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Break cycles and drop clauses irrelevant to the observed tuples. Default: true.
    pub prune: Option<bool>,
    /// Re-admit safe non-forward clauses after pruning. Default: true.
    pub augment: Option<bool>,
}

impl ProvenanceConfig {
    pub fn effective_prune(&self) -> bool {
        self.prune.unwrap_or(constants::DEFAULT_PRUNE)
    }

    pub fn effective_augment(&self) -> bool {
        self.augment.unwrap_or(constants::DEFAULT_AUGMENT)
    }

    /// Convenience constructor used by tests and embedders.
    pub fn with(prune: bool, augment: bool) -> Self {
        Self {
            prune: Some(prune),
            augment: Some(augment),
        }
    }
}
