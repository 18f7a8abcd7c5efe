//! Causal graphs from pruned provenance: tuples become sums over their
//! clauses, clauses become products over their bodies.

use std::hash::Hash;

use credence_core::errors::GraphError;
use credence_core::types::collections::{FxHashMap, FxIndexSet};
use credence_core::types::{ConstraintItem, Tuple};
use credence_provenance::{ProvId, Provenance};

use crate::categorical::Categorical01;
use crate::graph::{CausalGraph, PriorTable};

/// One independent prior per clause and per input, as returned by the closures.
pub fn from_provenance(
    prov: &Provenance,
    derive_dist: impl Fn(&ConstraintItem) -> Option<Categorical01>,
    input_dist: impl Fn(&Tuple) -> Option<Categorical01>,
) -> Result<CausalGraph<String>, GraphError> {
    let mut priors = PriorTable::new();
    for (k, clause) in prov.clauses().iter().enumerate() {
        if let Some(dist) = derive_dist(clause) {
            priors.add(clause_key(k), dist);
        }
    }
    for (k, input) in prov.inputs().iter().enumerate() {
        if let Some(dist) = input_dist(input) {
            priors.add(format!("I{k}"), dist);
        }
    }
    build(prov, &priors)
}

/// Like [`from_provenance`], but the closures return a tying key with the
/// prior; nodes with equal keys share the first prior seen for that key.
pub fn from_provenance_tied<K>(
    prov: &Provenance,
    derive_key: impl Fn(&ConstraintItem) -> Option<(K, Categorical01)>,
    input_key: impl Fn(&Tuple) -> Option<(K, Categorical01)>,
) -> Result<CausalGraph<String>, GraphError>
where
    K: Eq + Hash,
{
    let mut priors = PriorTable::new();
    let mut tied: FxHashMap<K, usize> = FxHashMap::default();
    let mut assign = |priors: &mut PriorTable<String>, node: String, key: K, dist| {
        match tied.get(&key) {
            Some(&dist_id) => priors.tie(node, dist_id),
            None => {
                tied.insert(key, priors.add(node, dist));
                Ok(())
            }
        }
    };
    for (k, clause) in prov.clauses().iter().enumerate() {
        if let Some((key, dist)) = derive_key(clause) {
            assign(&mut priors, clause_key(k), key, dist)?;
        }
    }
    for (k, input) in prov.inputs().iter().enumerate() {
        if let Some((key, dist)) = input_key(input) {
            assign(&mut priors, format!("I{k}"), key, dist)?;
        }
    }
    build(prov, &priors)
}

fn clause_key(k: usize) -> String {
    format!("D{k}")
}

fn build(
    prov: &Provenance,
    priors: &PriorTable<String>,
) -> Result<CausalGraph<String>, GraphError> {
    let head_to_clauses = prov.head_to_clauses();
    let clause_to_body = prov.clause_to_body();

    let mut nodes: FxIndexSet<String> = FxIndexSet::default();
    for (clause, body) in &clause_to_body {
        nodes.insert(clause.clone());
        if let Ok(head) = prov
            .decode_clause(clause)
            .and_then(|c| prov.tuple_id(c.head()))
        {
            nodes.insert(head);
        }
        nodes.extend(body.iter().cloned());
    }

    let mut singletons = prov.input_ids();
    // Body tuples nothing derives are treated like inputs without a prior.
    for node in &nodes {
        let derivable = matches!(
            node.parse::<ProvId>(),
            Ok(ProvId::Output(_) | ProvId::Hidden(_))
        );
        if derivable && !head_to_clauses.contains_key(node) {
            tracing::warn!(
                graph = prov.name(),
                node = %node,
                "tuple has no derivation, treating it as a singleton"
            );
            singletons.push(node.clone());
        }
    }

    let graph = CausalGraph::build_with_priors(
        prov.name(),
        nodes,
        singletons,
        head_to_clauses,
        clause_to_body,
        priors,
    )?;
    let cycles = graph.find_cycles();
    if !cycles.is_empty() {
        tracing::warn!(graph = graph.name(), cycles = cycles.len(), "causal graph contains cycles");
    }
    Ok(graph)
}
