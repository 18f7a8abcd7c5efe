//! Builder scenarios for provenance pruning and augmentation.

use credence_core::config::ProvenanceConfig;
use credence_core::traits::StaticFacts;
use credence_core::types::{ConstraintItem, Tuple};
use credence_provenance::{ProvId, ProvenanceBuilder};

fn t(rel: &str, i: u32) -> Tuple {
    Tuple::new(rel, [i])
}

fn cons1() -> ConstraintItem {
    ConstraintItem::positive(0, t("O", 0), vec![t("I", 1)])
}
fn cons21() -> ConstraintItem {
    ConstraintItem::positive(1, t("H", 2), vec![t("I", 2)])
}
fn cons22() -> ConstraintItem {
    ConstraintItem::positive(2, t("O", 0), vec![t("H", 2)])
}
fn cons20() -> ConstraintItem {
    ConstraintItem::positive(3, t("O", 0), vec![t("I", 2)])
}
fn loop0() -> ConstraintItem {
    ConstraintItem::positive(4, t("O", 1), vec![t("O", 0)])
}
fn loop1() -> ConstraintItem {
    ConstraintItem::positive(4, t("O", 0), vec![t("O", 1)])
}

fn build(
    config: ProvenanceConfig,
    clauses: Vec<ConstraintItem>,
    inputs: Vec<Tuple>,
    outputs: Vec<Tuple>,
) -> ProvenanceBuilder {
    let mut builder = ProvenanceBuilder::new("test", &config);
    builder.add_constraints(clauses);
    builder.add_input_tuples(inputs);
    builder.add_output_tuples(outputs);
    builder.compute_provenance().unwrap();
    builder
}

// =============================================================================
// Unpruned mode
// =============================================================================

/// T1-PROV-01: unpruned single derivation
#[test]
fn t1_prov_01_unpruned_simple() {
    let builder = build(
        ProvenanceConfig::with(false, false),
        vec![cons1()],
        vec![t("I", 1)],
        vec![t("O", 0)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.clauses().len(), 1);
    assert_eq!(prov.inputs().len(), 1);
    assert_eq!(prov.outputs().len(), 1);
    assert_eq!(prov.clauses()[0], cons1());
}

/// T1-PROV-02: unpruned mode keeps the loop
#[test]
fn t1_prov_02_unpruned_keeps_loop() {
    let builder = build(
        ProvenanceConfig::with(false, false),
        vec![cons1(), loop0(), loop1()],
        vec![t("I", 1)],
        vec![t("O", 0)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.clauses().len(), 3);
    assert_eq!(prov.inputs().len(), 1);
    assert_eq!(prov.outputs().len(), 1);
}

// =============================================================================
// Pruned mode
// =============================================================================

/// T1-PROV-03: the longer proof is truncated without augmentation
#[test]
fn t1_prov_03_prune_truncates_longer_proof() {
    let builder = build(
        ProvenanceConfig::with(true, false),
        vec![cons1(), cons21(), cons22()],
        vec![t("I", 1), t("I", 2)],
        vec![t("O", 0)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.clauses().len(), 1);
    assert_eq!(prov.inputs().len(), 1);
    assert_eq!(prov.outputs().len(), 1);
}

/// T1-PROV-04: augmentation restores the longer proof
#[test]
fn t1_prov_04_augment_restores_longer_proof() {
    let builder = build(
        ProvenanceConfig::with(true, true),
        vec![cons1(), cons21(), cons22()],
        vec![t("I", 1), t("I", 2)],
        vec![t("O", 0)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.clauses().len(), 3);
    assert_eq!(prov.inputs().len(), 2);
    assert_eq!(prov.outputs().len(), 1);
    // Insertion order survives pruning.
    assert_eq!(prov.clauses(), &[cons1(), cons21(), cons22()]);
}

/// T1-PROV-05: two forward proofs of equal length both survive
#[test]
fn t1_prov_05_prune_same_length_paths() {
    let builder = build(
        ProvenanceConfig::with(true, false),
        vec![cons1(), cons21(), cons22(), cons20()],
        vec![t("I", 1), t("I", 2)],
        vec![t("O", 0)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.clauses().len(), 2);
    assert_eq!(prov.inputs().len(), 2);
    assert_eq!(prov.outputs().len(), 1);
}

/// T1-PROV-06: the back edge of a loop is dropped even with augmentation
#[test]
fn t1_prov_06_prune_breaks_loop() {
    let builder = build(
        ProvenanceConfig::with(true, true),
        vec![cons1(), loop0(), loop1()],
        vec![t("I", 1)],
        vec![t("O", 0), t("O", 1)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.clauses().len(), 2);
    assert_eq!(prov.inputs().len(), 1);
    assert_eq!(prov.outputs().len(), 2);
    assert!(!prov.clauses().contains(&loop1()));
}

// =============================================================================
// Ids, inputs, and observation sets
// =============================================================================

/// T1-PROV-07: declared inputs that are derived stop being inputs
#[test]
fn t1_prov_07_derived_input_removed_from_inputs() {
    let mut builder = ProvenanceBuilder::new("expand", &ProvenanceConfig::with(true, true));
    builder.add_input_tuples([t("I", 1), t("H", 2)]);
    builder.add_constraints([cons21(), cons22()]);
    builder.add_output_tuples([t("O", 0)]);
    let prov = builder.compute_provenance().unwrap();
    assert!(prov.inputs().is_empty());
    // Nothing is born from an input, but augmentation still admits the acyclic chain.
    assert_eq!(prov.clauses().len(), 2);
    assert_eq!(prov.hidden(), &[t("H", 2), t("I", 2)]);
}

/// T1-PROV-08: ids partition the referenced tuples
#[test]
fn t1_prov_08_id_partitions() {
    let builder = build(
        ProvenanceConfig::with(true, true),
        vec![cons1(), cons21(), cons22()],
        vec![t("I", 1), t("I", 2)],
        vec![t("O", 0)],
    );
    let prov = builder.provenance().unwrap();
    assert_eq!(prov.input_ids(), vec!["I0", "I1"]);
    assert_eq!(prov.output_ids(), vec!["O0"]);
    assert_eq!(prov.hidden_ids(), vec!["H0"]);
    assert_eq!(prov.clause_ids(), vec!["D0", "D1", "D2"]);
    assert_eq!(prov.tuple_id(&t("H", 2)).unwrap(), "H0");
    assert_eq!(prov.decode_tuple("I1").unwrap(), &t("I", 2));
    assert_eq!(prov.decode_clause("D1").unwrap(), &cons21());
    assert_eq!(prov.tuple_prov_id(&t("O", 0)), Some(ProvId::Output(0)));

    let heads = prov.head_to_clauses();
    assert_eq!(heads["O0"], vec!["D0", "D2"]);
    assert_eq!(heads["H0"], vec!["D1"]);
    let bodies = prov.clause_to_body();
    assert_eq!(bodies["D2"], vec!["H0"]);
    assert_eq!(bodies.keys().collect::<Vec<_>>(), vec!["D0", "D1", "D2"]);
}

/// T1-PROV-09: observing a subset restricts the active clauses
#[test]
fn t1_prov_09_compute_for_subset() {
    let mut builder = ProvenanceBuilder::new("subset", &ProvenanceConfig::with(true, true));
    builder.add_constraints([cons1(), loop0()]);
    builder.add_input_tuples([t("I", 1)]);
    builder.add_output_tuples([t("O", 0), t("O", 1)]);
    let prov = builder.compute_provenance_for(&[t("O", 0)]).unwrap();
    assert_eq!(prov.clauses(), &[cons1()]);
    assert_eq!(prov.outputs(), &[t("O", 0)]);
}

/// T1-PROV-10: provenance is unavailable before computing
#[test]
fn t1_prov_10_not_computed() {
    let builder = ProvenanceBuilder::new("empty", &ProvenanceConfig::default());
    assert!(builder.provenance().is_err());
    assert!(builder.dump_provenance(std::path::Path::new("unused")).is_err());
}

/// T1-PROV-11: building from a static fact source
#[test]
fn t1_prov_11_from_source() {
    let facts = StaticFacts {
        constraints: vec![cons1(), cons21(), cons22()],
        inputs: vec![t("I", 1), t("I", 2)],
        outputs: vec![t("O", 0)],
        rules: vec!["O(x) :- I(x).".into(), "H(x) :- I(x).".into()],
    };
    let mut builder = ProvenanceBuilder::from_source("src", &ProvenanceConfig::default(), &facts);
    let prov = builder.compute_provenance().unwrap();
    assert_eq!(prov.clauses().len(), 3);
    assert_eq!(prov.rule_infos().len(), 2);
}

// =============================================================================
// Dump
// =============================================================================

/// T1-PROV-12: dump writes the four dictionaries
#[test]
fn t1_prov_12_dump_provenance() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut builder = ProvenanceBuilder::new("dump", &ProvenanceConfig::with(false, false));
    builder.add_rule_infos(["rule1".to_string()]);
    builder.add_constraints([cons1()]);
    builder.add_input_tuples([t("I", 1)]);
    builder.add_output_tuples([t("O", 0)]);
    builder.compute_provenance().unwrap();
    builder.dump_provenance(dir.path()).unwrap();

    let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
    let cons = read("cons_pruned.txt");
    assert_eq!(cons.lines().count(), 1);
    assert_eq!(cons.lines().next().unwrap(), "R0-D0 : O0=I0");
    assert_eq!(read("tuple_dict.txt"), "I0:\tI(1)\nO0:\tO(0)\n");
    assert_eq!(read("rule_dict.txt"), "R0:\trule1\n");
    assert_eq!(read("base_queries.txt"), "O0\n");
}

/// T1-PROV-13: negated literals are marked in the clause dictionary
#[test]
fn t1_prov_13_dump_negation_marks() {
    let dir = tempfile::TempDir::new().unwrap();
    let negated = ConstraintItem::new(
        7,
        t("O", 0),
        false,
        vec![(t("I", 1), false), (t("I", 2), true)],
    );
    let mut builder = ProvenanceBuilder::new("neg", &ProvenanceConfig::with(false, false));
    builder.add_constraints([negated]);
    builder.add_input_tuples([t("I", 1), t("I", 2)]);
    builder.add_output_tuples([t("O", 0)]);
    let prov = builder.compute_provenance().unwrap();
    assert_eq!(prov.unfold_id("D0").unwrap(), "R7-D0 : NOT O0=NOT I0,I1");
    prov.dump(dir.path()).unwrap();
    let cons = std::fs::read_to_string(dir.path().join("cons_pruned.txt")).unwrap();
    assert_eq!(cons, "R7-D0 : NOT O0=NOT I0,I1\n");
}
