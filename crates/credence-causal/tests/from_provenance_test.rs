//! Tests for building causal graphs from computed provenance.

use credence_causal::{from_provenance, from_provenance_tied, Categorical01};
use credence_core::config::ProvenanceConfig;
use credence_core::types::{ConstraintItem, Tuple};
use credence_provenance::{Provenance, ProvenanceBuilder};

fn t(rel: &str, i: u32) -> Tuple {
    Tuple::new(rel, [i])
}

/// O0 := I1 | O0 := H2, H2 := I2.
fn two_path_provenance() -> Provenance {
    let mut builder = ProvenanceBuilder::new("two_path", &ProvenanceConfig::default());
    builder.add_constraints([
        ConstraintItem::positive(0, t("O", 0), vec![t("I", 1)]),
        ConstraintItem::positive(1, t("H", 2), vec![t("I", 2)]),
        ConstraintItem::positive(1, t("O", 0), vec![t("H", 2)]),
    ]);
    builder.add_input_tuples([t("I", 1), t("I", 2)]);
    builder.add_output_tuples([t("O", 0)]);
    builder.compute_provenance().unwrap();
    builder.into_provenance().unwrap()
}

/// T2-PROV-01: structure mirrors the provenance
#[test]
fn t2_prov_01_structure() {
    let prov = two_path_provenance();
    let g = from_provenance(
        &prov,
        |_| Some(Categorical01::bernoulli(0.9).unwrap()),
        |_| Some(Categorical01::bernoulli(0.5).unwrap()),
    )
    .unwrap();

    let names: Vec<&String> = g.nodes().collect();
    assert_eq!(names, ["D0", "O0", "I0", "D1", "H0", "I1", "D2"]);
    let id = |n: &str| g.node_id(&n.to_string()).unwrap();

    assert!(g.is_singleton(id("I0")) && g.is_singleton(id("I1")));
    assert_eq!(g.sum(id("O0")), Some(&[id("D0"), id("D2")][..]));
    assert_eq!(g.sum(id("H0")), Some(&[id("D1")][..]));
    assert_eq!(g.prod(id("D2")), Some(&[id("H0")][..]));
    assert_eq!(g.dist_size(), 5);
    assert!(g.is_stoch_node(id("D1")) && g.is_stoch_node(id("I1")));
    assert!(!g.is_stoch_node(id("O0")));
    assert!(g.find_cycles().is_empty());
}

/// T2-PROV-02: closures returning None leave nodes deterministic
#[test]
fn t2_prov_02_partial_priors() {
    let prov = two_path_provenance();
    let g = from_provenance(
        &prov,
        |c| (c.rule_id() == 0).then(|| Categorical01::bernoulli(0.7).unwrap()),
        |_| None,
    )
    .unwrap();
    assert_eq!(g.dist_size(), 1);
    assert_eq!(g.dist_id_of(g.node_id(&"D0".to_string()).unwrap()), Some(0));
}

/// T2-PROV-03: equal keys tie clauses of the same rule
#[test]
fn t2_prov_03_tied_by_rule() {
    let prov = two_path_provenance();
    let g = from_provenance_tied(
        &prov,
        |c| Some((c.rule_id(), Categorical01::bernoulli(0.9).unwrap())),
        |_| None,
    )
    .unwrap();
    let id = |n: &str| g.node_id(&n.to_string()).unwrap();
    assert_eq!(g.dist_size(), 2);
    assert_eq!(g.dist_id_of(id("D1")), g.dist_id_of(id("D2")));
    assert_ne!(g.dist_id_of(id("D0")), g.dist_id_of(id("D1")));
}

/// T2-PROV-04: underived body tuples become singletons
#[test]
fn t2_prov_04_underived_tuple_singleton() {
    let mut builder = ProvenanceBuilder::new("open", &ProvenanceConfig::with(false, false));
    builder.add_constraints([ConstraintItem::positive(0, t("O", 0), vec![t("X", 1)])]);
    builder.add_output_tuples([t("O", 0)]);
    let prov = builder.compute_provenance().unwrap().clone();
    let g = from_provenance(&prov, |_| None, |_| None).unwrap();
    assert!(g.is_singleton(g.node_id(&"H0".to_string()).unwrap()));
}
