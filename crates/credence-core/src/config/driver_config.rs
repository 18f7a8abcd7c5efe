//! Causal driver configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DriverConfig {
    /// Driver strategy: "iterating", "oneshot", "em", "dynaboost". Default: "iterating".
    pub kind: Option<String>,
    /// Fixed derivation probability used by the dynaboost driver. Default: 0.999.
    pub rule_prob: Option<f64>,
    /// Root directory for per-driver artifacts. Default: "credence-out".
    pub work_dir: Option<String>,
}

impl DriverConfig {
    pub fn effective_kind(&self) -> &str {
        self.kind
            .as_deref()
            .unwrap_or(constants::DEFAULT_DRIVER_KIND)
    }

    pub fn effective_rule_prob(&self) -> f64 {
        self.rule_prob.unwrap_or(constants::DEFAULT_RULE_PROB)
    }

    pub fn effective_work_dir(&self) -> &str {
        self.work_dir
            .as_deref()
            .unwrap_or(constants::DEFAULT_WORK_DIR)
    }
}
