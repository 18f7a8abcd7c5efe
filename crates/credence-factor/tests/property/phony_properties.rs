//! Phony decomposition preserves clause semantics: T3-PHONY-P01 and T3-PHONY-P02.

use proptest::prelude::*;

use credence_causal::{Categorical01, CausalGraph};
use credence_core::config::CompilerConfig;
use credence_factor::{compile, ExactSolver, Solver, SolverOptions};

/// `H = X0 op ... op X{n-1}`, every `Xi` a point prior, `H` optionally stochastic.
fn clause_graph(priors: &[f64], is_sum: bool, head_prior: Option<f64>) -> CausalGraph<String> {
    let xs: Vec<String> = (0..priors.len()).map(|i| format!("X{i}")).collect();
    let mut nodes = xs.clone();
    nodes.push("H".to_string());
    let derivation = vec![("H".to_string(), xs.clone())];
    let (sums, prods) = if is_sum {
        (derivation, Vec::new())
    } else {
        (Vec::new(), derivation)
    };
    let mut graph = CausalGraph::build("clause", nodes, xs.clone(), sums, prods).unwrap();
    for (x, p) in xs.iter().zip(priors) {
        graph.set_stoch_node(x, Categorical01::bernoulli(*p).unwrap());
    }
    if let Some(q) = head_prior {
        graph.set_stoch_node(&"H".to_string(), Categorical01::bernoulli(q).unwrap());
    }
    graph
}

fn expected(priors: &[f64], is_sum: bool, head_prior: Option<f64>) -> f64 {
    let body = if is_sum {
        1.0 - priors.iter().map(|p| 1.0 - p).product::<f64>()
    } else {
        priors.iter().product::<f64>()
    };
    body * head_prior.unwrap_or(1.0)
}

fn head_marginal(graph: &CausalGraph<String>, bayes: bool, clause_limit: usize) -> f64 {
    let config = CompilerConfig {
        clause_limit: Some(clause_limit),
        ..Default::default()
    };
    let spec = compile(graph, 0, bayes, &config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clause.fg");
    spec.write_fg(&path).unwrap();
    let mut net = ExactSolver::new()
        .load(&path, &SolverOptions::default())
        .unwrap();
    let head = spec.layout().node_var(0, graph.node_size() - 1);
    net.query_marginal(head).unwrap()
}

// =============================================================================
// T3-PHONY-P01: the head marginal matches the undecomposed clause
// =============================================================================
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn t3_phony_p01_equivalent_marginal(
        priors in prop::collection::vec(0.05_f64..0.95, 1..=20),
        is_sum in any::<bool>(),
        head_prior in prop::option::of(0.05_f64..0.95),
        bayes in any::<bool>(),
        clause_limit in 2_usize..=5,
    ) {
        let graph = clause_graph(&priors, is_sum, head_prior);
        let got = head_marginal(&graph, bayes, clause_limit);
        let want = expected(&priors, is_sum, head_prior);
        prop_assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
    }
}

// =============================================================================
// T3-PHONY-P02: no factor exceeds the clause limit plus head and control
// =============================================================================
proptest! {
    #[test]
    fn t3_phony_p02_factor_width(
        n in 1_usize..=40,
        clause_limit in 2_usize..=6,
        stochastic in any::<bool>(),
        bayes in any::<bool>(),
    ) {
        let priors = vec![0.5; n];
        let graph = clause_graph(&priors, true, stochastic.then_some(0.5));
        let config = CompilerConfig {
            clause_limit: Some(clause_limit),
            ..Default::default()
        };
        let spec = compile(&graph, 1, bayes, &config).unwrap();
        let layout = spec.layout();
        prop_assert_eq!(spec.factors().count(), layout.num_factors());
        for f in spec.factors() {
            prop_assert!(f.vars().len() <= clause_limit + 1);
        }
    }
}
