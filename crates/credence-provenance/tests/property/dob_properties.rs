//! Property tests for the DOB pruner: T1-DOB-01 through T1-DOB-04.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use proptest::prelude::*;

use credence_core::config::ProvenanceConfig;
use credence_core::types::{ConstraintItem, Tuple};
use credence_provenance::{DobSolver, ProvenanceBuilder};

fn tuple(i: usize) -> Tuple {
    Tuple::new("T", [i as u32])
}

/// Random clause list over `n` tuples; tuple 0 and 1 are inputs.
fn build_clauses(edges: &[(usize, Vec<usize>)]) -> Vec<ConstraintItem> {
    edges
        .iter()
        .enumerate()
        .map(|(rule, (head, body))| {
            let body = body.iter().map(|b| tuple(*b)).collect();
            ConstraintItem::positive(rule as u32, tuple(*head), body)
        })
        .collect()
}

fn clause_strategy(n: usize) -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
    prop::collection::vec((2..n, prop::collection::vec(0..n, 1..4)), 1..n * 3)
}

/// Tuple-level dependency graph of a clause subset: body -> head.
fn dependency_graph(clauses: &[ConstraintItem], subset: &[usize]) -> DiGraphMap<u32, ()> {
    let mut graph = DiGraphMap::new();
    for &c in subset {
        let head = clauses[c].head().attributes()[0];
        graph.add_node(head);
        for body in clauses[c].body_tuples() {
            graph.add_edge(body.attributes()[0], head, ());
        }
    }
    graph
}

fn inputs() -> Vec<Tuple> {
    vec![tuple(0), tuple(1)]
}

// =============================================================================
// T1-DOB-01: Forward clauses are acyclic
// =============================================================================
proptest! {
    #[test]
    fn t1_dob_01_forward_acyclic(edges in clause_strategy(12)) {
        let clauses = build_clauses(&edges);
        let solver = DobSolver::new(&clauses, inputs().iter());
        let graph = dependency_graph(&clauses, &solver.forward_clauses());
        prop_assert!(toposort(&graph, None).is_ok(), "forward clauses contain a cycle");
    }
}

// =============================================================================
// T1-DOB-02: Augmentation never closes a cycle
// =============================================================================
proptest! {
    #[test]
    fn t1_dob_02_augmented_acyclic(edges in clause_strategy(12)) {
        let clauses = build_clauses(&edges);
        let mut solver = DobSolver::new(&clauses, inputs().iter());
        solver.augment();
        let augmented = solver.augmented_clauses();
        for c in solver.forward_clauses() {
            prop_assert!(augmented.contains(&c));
        }
        let graph = dependency_graph(&clauses, &augmented);
        prop_assert!(toposort(&graph, None).is_ok(), "augmented clauses contain a cycle");
    }
}

// =============================================================================
// T1-DOB-03: DOBs stay in range and heads of forward clauses outlive bodies
// =============================================================================
proptest! {
    #[test]
    fn t1_dob_03_dob_bounds(edges in clause_strategy(10)) {
        let clauses = build_clauses(&edges);
        let solver = DobSolver::new(&clauses, inputs().iter());
        for clause in &clauses {
            let head = solver.dob(clause.head()).unwrap();
            prop_assert!(head <= solver.max_dob());
            let body: Vec<usize> = clause.body_tuples().map(|t| solver.dob(t).unwrap()).collect();
            // A fully born body bounds its head's birth date.
            if body.iter().all(|&b| b < solver.max_dob()) {
                let max_body = body.iter().copied().max().unwrap_or(0);
                prop_assert!(head <= (max_body + 1).min(solver.max_dob()));
            }
        }
        for input in inputs() {
            if let Ok(dob) = solver.dob(&input) {
                prop_assert_eq!(dob, 0);
            }
        }
    }
}

// =============================================================================
// T1-DOB-04: Every retained clause lies on a path to an observed tuple
// =============================================================================
proptest! {
    #[test]
    fn t1_dob_04_active_clauses_relevant(edges in clause_strategy(10), observe in 2_usize..10) {
        let clauses = build_clauses(&edges);
        let mut builder = ProvenanceBuilder::new("prop", &ProvenanceConfig::with(true, true));
        builder.add_constraints(clauses);
        builder.add_input_tuples(inputs());
        let prov = builder.compute_provenance_for(&[tuple(observe)]).unwrap();

        let kept: Vec<usize> = (0..prov.clauses().len()).collect();
        let graph = dependency_graph(prov.clauses(), &kept);
        prop_assert!(toposort(&graph, None).is_ok());
        let target = observe as u32;
        for clause in prov.clauses() {
            let head = clause.head().attributes()[0];
            prop_assert!(
                head == target || petgraph::algo::has_path_connecting(&graph, head, target, None),
                "clause head {} cannot reach observed tuple", head
            );
        }
    }
}
