//! Upstream boundary: the rule engine that produced the derivations.

use serde::{Deserialize, Serialize};

use crate::types::{ConstraintItem, Tuple};

/// A fact/derivation feed exposed by the analysis engine.
///
/// Plain collections; no streaming contract.
pub trait FactSource {
    fn constraint_items(&self) -> &[ConstraintItem];

    fn input_facts(&self) -> &[Tuple];

    fn output_facts(&self) -> &[Tuple];

    /// Textual rule descriptions indexed by rule id.
    fn rule_infos(&self) -> &[String] {
        &[]
    }
}

/// In-memory fact feed, also the deserialization target of fixture files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFacts {
    pub constraints: Vec<ConstraintItem>,
    pub inputs: Vec<Tuple>,
    pub outputs: Vec<Tuple>,
    pub rules: Vec<String>,
}

impl FactSource for StaticFacts {
    fn constraint_items(&self) -> &[ConstraintItem] {
        &self.constraints
    }

    fn input_facts(&self) -> &[Tuple] {
        &self.inputs
    }

    fn output_facts(&self) -> &[Tuple] {
        &self.outputs
    }

    fn rule_infos(&self) -> &[String] {
        &self.rules
    }
}
