//! Fixture-driven pruning scenarios from `fixtures/provenance/`.

use credence_core::config::ProvenanceConfig;
use credence_provenance::ProvenanceBuilder;
use test_fixtures::{list_fixtures, load_path, ProvenanceScenario};

/// T1-GOLD-01: every provenance fixture matches its expected sizes
#[test]
fn t1_gold_01_provenance_fixtures() {
    let files = list_fixtures("provenance");
    assert!(!files.is_empty(), "no provenance fixtures found");
    for path in files {
        let scenario: ProvenanceScenario = load_path(&path);
        let config = ProvenanceConfig::with(scenario.prune, scenario.augment);
        let mut builder = ProvenanceBuilder::from_source(&scenario.name, &config, &scenario.facts);
        let prov = builder.compute_provenance().unwrap();
        assert_eq!(
            prov.clauses().len(),
            scenario.expected.clauses,
            "{}: clause count",
            scenario.name
        );
        assert_eq!(
            prov.inputs().len(),
            scenario.expected.inputs,
            "{}: input count",
            scenario.name
        );
        assert_eq!(
            prov.outputs().len(),
            scenario.expected.outputs,
            "{}: output count",
            scenario.name
        );
    }
}
