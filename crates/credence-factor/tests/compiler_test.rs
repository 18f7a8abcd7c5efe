//! Tests for factor-graph layout, encodings, and the text writers.

use credence_causal::{Categorical01, CausalGraph, PriorTable};
use credence_core::config::CompilerConfig;
use credence_core::errors::CompileError;
use credence_factor::compiler::{write_em, write_tab};
use credence_factor::{compile, Factor};

fn s(v: &str) -> String {
    v.to_string()
}

fn limit(clause_limit: usize) -> CompilerConfig {
    CompilerConfig {
        clause_limit: Some(clause_limit),
        ..Default::default()
    }
}

/// C = A or B, both coins with a point prior of 0.5.
fn two_coins() -> CausalGraph<String> {
    let mut priors = PriorTable::new();
    priors.add(s("A"), Categorical01::bernoulli(0.5).unwrap());
    priors.add(s("B"), Categorical01::bernoulli(0.5).unwrap());
    CausalGraph::build_with_priors(
        "coins",
        [s("A"), s("B"), s("C")],
        [s("A"), s("B")],
        [(s("C"), vec![s("A"), s("B")])],
        Vec::<(String, Vec<String>)>::new(),
        &priors,
    )
    .unwrap()
}

/// C = D, D = A with a stochastic clause D.
fn gated_chain() -> CausalGraph<String> {
    let mut priors = PriorTable::new();
    priors.add(s("A"), Categorical01::bernoulli(0.5).unwrap());
    priors.add(s("D"), Categorical01::bernoulli(0.75).unwrap());
    CausalGraph::build_with_priors(
        "chain",
        [s("A"), s("D"), s("C")],
        [s("A")],
        [(s("C"), vec![s("D")])],
        [(s("D"), vec![s("A")])],
        &priors,
    )
    .unwrap()
}

/// H = X0 or ... or X{n-1}, no priors.
fn wide_sum(n: usize) -> CausalGraph<String> {
    let xs: Vec<String> = (0..n).map(|i| format!("X{i}")).collect();
    let mut nodes = xs.clone();
    nodes.push(s("H"));
    CausalGraph::build(
        "wide",
        nodes,
        xs.clone(),
        [(s("H"), xs)],
        Vec::<(String, Vec<String>)>::new(),
    )
    .unwrap()
}

fn reps(f: &Factor) -> Vec<u64> {
    f.entries().iter().map(|e| e.0).collect()
}

// =============================================================================
// Layout
// =============================================================================

/// T3-COMP-01: the two-coin graph renders to the expected .fg text
#[test]
fn t3_comp_01_two_coins_golden() {
    let spec = compile(&two_coins(), 0, true, &CompilerConfig::default()).unwrap();
    let expected = "5\n\
        \n1\n0\n1\n1\n0 1\n\
        \n1\n1\n1\n1\n0 1\n\
        \n3\n4 2 3\n2 2 2\n4\n0 1\n3 1\n5 1\n7 1\n\
        \n2\n2 0\n2 1\n2\n0 0.5\n1 0.5\n\
        \n2\n3 1\n2 1\n2\n0 0.5\n1 0.5\n";
    assert_eq!(spec.to_fg_string(), expected);
}

/// T3-COMP-02: factor count is dist_size + shift * (num_repeats + 1)
#[test]
fn t3_comp_02_replica_addressing() {
    let spec = compile(&gated_chain(), 2, true, &CompilerConfig::default()).unwrap();
    let layout = spec.layout();
    assert_eq!(layout.dist_size(), 2);
    assert_eq!(layout.allocated_latents(), 1);
    assert_eq!(layout.shift(), 4);
    assert_eq!(layout.num_factors(), 14);
    assert_eq!(spec.num_factors(), 14);
    assert_eq!(spec.factors().count(), 14);
    assert_eq!(layout.offset(1), 6);
    assert_eq!(layout.node_var(1, 2), 8);
    assert_eq!(layout.latent_var(1, 1), Some(9));
    assert_eq!(layout.latent_var(1, 0), None);
}

/// T3-COMP-03: Bayesian mode gates stochastic clauses through a latent
#[test]
fn t3_comp_03_bayes_latent_gate() {
    let spec = compile(&gated_chain(), 0, true, &CompilerConfig::default()).unwrap();
    let factors: Vec<Factor> = spec.factors().collect();
    // params, latent, C sum, D prod, A singleton
    assert_eq!(factors.len(), 6);
    assert_eq!(factors[1].entries(), &[(0, 1.0)]);
    assert_eq!(factors[2].vars(), &[5, 1]);
    assert_eq!(factors[2].entries(), &[(0, 0.25), (1, 0.75)]);
    assert_eq!(factors[3].vars(), &[4, 3]);
    assert_eq!(factors[4].vars(), &[3, 5, 2]);
    assert_eq!(reps(&factors[4]), vec![0, 2, 4, 7]);
    assert_eq!(factors[5].vars(), &[2, 0]);
    assert_eq!(factors[5].cards(), &[2, 1]);
}

/// T3-COMP-04: direct mode gates on the parameter and keeps binary params
#[test]
fn t3_comp_04_direct_parameter_gate() {
    let spec = compile(&gated_chain(), 0, false, &CompilerConfig::default()).unwrap();
    let layout = spec.layout();
    assert_eq!(layout.latents().len(), 1);
    assert_eq!(layout.allocated_latents(), 0);
    assert_eq!(layout.shift(), 3);
    let factors: Vec<Factor> = spec.factors().collect();
    assert_eq!(factors.len(), 5);
    assert_eq!(factors[0].entries(), &[(0, 0.5), (1, 0.5)]);
    assert_eq!(factors[1].entries(), &[(0, 0.25), (1, 0.75)]);
    assert_eq!(factors[3].vars(), &[3, 1, 2]);
    assert_eq!(factors[4].vars(), &[2, 0]);
    assert_eq!(factors[4].entries(), &[(0, 1.0), (3, 1.0)]);
}

/// T3-COMP-05: a singleton without a prior is forced true
#[test]
fn t3_comp_05_constant_singleton() {
    let spec = compile(&wide_sum(1), 0, true, &CompilerConfig::default()).unwrap();
    let text = spec.to_fg_string();
    assert!(text.ends_with("\n1\n0\n2\n1\n1 1\n"), "{text}");
}

// =============================================================================
// Phony decomposition
// =============================================================================

/// T3-COMP-06: a wide body is split into phony heads placed after the nodes
#[test]
fn t3_comp_06_phony_split() {
    let spec = compile(&wide_sum(6), 0, true, &limit(4)).unwrap();
    let layout = spec.layout();
    assert_eq!(layout.phony_count(), 1);
    assert_eq!(layout.phony_var(0, 0), 7);
    let factors: Vec<Factor> = spec.factors().collect();
    assert_eq!(factors.len(), 8);
    assert_eq!(factors[0].vars(), &[7, 0, 1, 2, 3]);
    assert_eq!(factors[1].vars(), &[6, 7, 4, 5]);
}

/// T3-COMP-07: repeated passes until the body fits
#[test]
fn t3_comp_07_phony_multiple_passes() {
    let spec = compile(&wide_sum(20), 1, false, &limit(4)).unwrap();
    let layout = spec.layout();
    assert_eq!(layout.phony_count(), 6);
    assert_eq!(layout.shift(), 27);
    assert_eq!(spec.factors().count(), 54);
    for f in spec.factors() {
        assert!(f.vars().len() <= 5);
    }
}

/// T3-COMP-08: a stochastic head leaves room for the control variable
#[test]
fn t3_comp_08_gated_head_limit() {
    let mut graph = wide_sum(4);
    graph.set_stoch_node(&s("H"), Categorical01::bernoulli(0.9).unwrap());
    let spec = compile(&graph, 0, true, &limit(4)).unwrap();
    assert_eq!(spec.layout().phony_count(), 1);
    for f in spec.factors() {
        assert!(f.vars().len() <= 5);
    }
}

/// T3-COMP-09: clause limits outside [2, 62] are rejected
#[test]
fn t3_comp_09_invalid_clause_limit() {
    for bad in [0, 1, 63] {
        let err = compile(&two_coins(), 0, true, &limit(bad)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidClauseLimit { limit } if limit == bad));
    }
}

// =============================================================================
// Writers
// =============================================================================

/// T3-COMP-10: a written .fg file matches the in-memory rendering
#[test]
fn t3_comp_10_write_fg_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coins.fg");
    let spec = compile(&two_coins(), 0, true, &CompilerConfig::default()).unwrap();
    spec.write_fg(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), spec.to_fg_string());
}

/// T3-COMP-11: an unwritable path is an I/O error
#[test]
fn t3_comp_11_write_fg_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("coins.fg");
    let spec = compile(&two_coins(), 0, true, &CompilerConfig::default()).unwrap();
    assert!(matches!(spec.write_fg(&path), Err(CompileError::Io { .. })));
}

/// T3-COMP-12: evidence and EM spec formats
#[test]
fn t3_comp_12_tab_and_em_formats() {
    let dir = tempfile::tempdir().unwrap();
    let tab = dir.path().join("run.tab");
    let em = dir.path().join("run.em");
    write_tab(
        &tab,
        &[5, 7],
        &[vec![Some(true), None], vec![None, Some(false)]],
    )
    .unwrap();
    write_em(&em, &[0, 1]).unwrap();
    assert_eq!(std::fs::read_to_string(&tab).unwrap(), "5\t7\n\n1\t\n\t0\n");
    assert_eq!(
        std::fs::read_to_string(&em).unwrap(),
        "1\n\n2\n\
         CondProbEstimation [target_dim=2,total_dim=2]\n1\n0\t0\n\
         CondProbEstimation [target_dim=2,total_dim=2]\n1\n1\t1\n"
    );
}
