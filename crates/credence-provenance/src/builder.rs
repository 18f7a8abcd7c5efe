//! Fact accumulation and active-clause computation.

use std::collections::VecDeque;
use std::path::Path;

use credence_core::config::ProvenanceConfig;
use credence_core::errors::ProvenanceError;
use credence_core::traits::FactSource;
use credence_core::types::collections::{FxHashMap, FxIndexSet};
use credence_core::types::{ConstraintItem, Tuple};
use tracing::instrument;

use crate::dob::DobSolver;
use crate::provenance::Provenance;

/// Collects clauses, inputs, and outputs, then prunes them into a [`Provenance`].
///
/// All collections are insertion-ordered sets; re-adding a fact is a no-op.
#[derive(Debug, Clone)]
pub struct ProvenanceBuilder {
    name: String,
    prune: bool,
    augment: bool,
    rule_infos: FxIndexSet<String>,
    constraints: FxIndexSet<ConstraintItem>,
    inputs: FxIndexSet<Tuple>,
    outputs: FxIndexSet<Tuple>,
    provenance: Option<Provenance>,
}

impl ProvenanceBuilder {
    pub fn new(name: impl Into<String>, config: &ProvenanceConfig) -> Self {
        Self {
            name: name.into(),
            prune: config.effective_prune(),
            augment: config.effective_augment(),
            rule_infos: FxIndexSet::default(),
            constraints: FxIndexSet::default(),
            inputs: FxIndexSet::default(),
            outputs: FxIndexSet::default(),
            provenance: None,
        }
    }

    /// Builder pre-filled from an upstream fact source.
    pub fn from_source(
        name: impl Into<String>,
        config: &ProvenanceConfig,
        source: &dyn FactSource,
    ) -> Self {
        let mut builder = Self::new(name, config);
        builder.add_rule_infos(source.rule_infos().iter().cloned());
        builder.add_input_tuples(source.input_facts().iter().cloned());
        builder.add_constraints(source.constraint_items().iter().cloned());
        builder.add_output_tuples(source.output_facts().iter().cloned());
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_rule_infos(&mut self, infos: impl IntoIterator<Item = String>) {
        self.rule_infos.extend(infos);
    }

    /// A clause head that is a declared input gets its proof expanded,
    /// so the tuple stops being an input.
    pub fn add_constraints(&mut self, constraints: impl IntoIterator<Item = ConstraintItem>) {
        let before = self.constraints.len();
        for clause in constraints {
            if self.inputs.shift_remove(clause.head()) {
                tracing::warn!(
                    builder = %self.name,
                    tuple = %clause.head(),
                    "expanding proof of tuple, removing it from inputs"
                );
            }
            self.constraints.insert(clause);
        }
        tracing::debug!(
            builder = %self.name,
            added = self.constraints.len() - before,
            "constraints added"
        );
    }

    pub fn add_input_tuples(&mut self, tuples: impl IntoIterator<Item = Tuple>) {
        self.inputs.extend(tuples);
    }

    pub fn add_output_tuples(&mut self, tuples: impl IntoIterator<Item = Tuple>) {
        self.outputs.extend(tuples);
    }

    /// Prune against the declared outputs.
    pub fn compute_provenance(&mut self) -> Result<&Provenance, ProvenanceError> {
        let observe: Vec<Tuple> = self.outputs.iter().cloned().collect();
        self.compute_provenance_for(&observe)
    }

    #[instrument(name = "credence.prune", skip(self, observe), fields(builder = %self.name))]
    pub fn compute_provenance_for(
        &mut self,
        observe: &[Tuple],
    ) -> Result<&Provenance, ProvenanceError> {
        let clauses: Vec<ConstraintItem> = self.constraints.iter().cloned().collect();
        let active = if self.prune {
            let mut solver = DobSolver::new(&clauses, self.inputs.iter());
            if self.augment {
                solver.augment();
            }
            solver.active_clauses(observe)
        } else {
            backward_closure(&clauses, observe)
        };

        let mut universe: FxIndexSet<Tuple> = FxIndexSet::default();
        let mut retained = Vec::with_capacity(active.len());
        for c in active {
            let clause = &clauses[c];
            universe.insert(clause.head().clone());
            universe.extend(clause.body_tuples().cloned());
            retained.push(clause.clone());
        }
        let inputs: Vec<Tuple> = self
            .inputs
            .iter()
            .filter(|t| universe.contains(*t))
            .cloned()
            .collect();
        let outputs: Vec<Tuple> = self
            .outputs
            .iter()
            .filter(|t| universe.contains(*t) && !self.inputs.contains(*t))
            .cloned()
            .collect();

        tracing::info!(
            clauses = retained.len(),
            of = clauses.len(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            "provenance computed"
        );

        let provenance = Provenance::new(
            self.name.clone(),
            universe.into_iter().collect(),
            inputs,
            outputs,
            retained,
            self.rule_infos.iter().cloned().collect(),
        );
        Ok(self.provenance.insert(provenance))
    }

    pub fn provenance(&self) -> Result<&Provenance, ProvenanceError> {
        self.provenance
            .as_ref()
            .ok_or_else(|| ProvenanceError::NotComputed {
                name: self.name.clone(),
            })
    }

    pub fn into_provenance(self) -> Result<Provenance, ProvenanceError> {
        let name = self.name;
        self.provenance
            .ok_or(ProvenanceError::NotComputed { name })
    }

    pub fn dump_provenance(&self, dir: &Path) -> Result<(), ProvenanceError> {
        self.provenance()?.dump(dir)
    }
}

/// Every clause reachable backward from `observe`, no cycle breaking.
fn backward_closure(clauses: &[ConstraintItem], observe: &[Tuple]) -> Vec<usize> {
    let mut antecedents: FxHashMap<&Tuple, Vec<usize>> = FxHashMap::default();
    for (c, clause) in clauses.iter().enumerate() {
        antecedents.entry(clause.head()).or_default().push(c);
    }
    let mut active = vec![false; clauses.len()];
    let mut worklist: VecDeque<&Tuple> = observe.iter().collect();
    while let Some(t) = worklist.pop_front() {
        let Some(derivers) = antecedents.get(t) else {
            continue;
        };
        for &c in derivers {
            if !active[c] {
                active[c] = true;
                worklist.extend(clauses[c].body_tuples());
            }
        }
    }
    (0..clauses.len()).filter(|&c| active[c]).collect()
}
