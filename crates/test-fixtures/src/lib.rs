//! Test fixture loader for Credence scenarios.
//!
//! Provides typed deserialization of the fixture JSON files under `fixtures/`
//! and helper functions for loading them in tests across crates.

use std::path::PathBuf;

use credence_core::traits::StaticFacts;
use credence_core::types::Tuple;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Root directory of the fixtures folder.
fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find fixtures/.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("fixtures").is_dir() {
        if !path.pop() {
            panic!(
                "Could not find fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// List all JSON files in a fixture subdirectory, sorted by file name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension().is_some_and(|ext| ext == "json").then_some(path)
        })
        .collect();
    files.sort();
    files
}

/// Load a fixture by absolute path, as returned by [`list_fixtures`].
pub fn load_path<T: DeserializeOwned>(path: &std::path::Path) -> T {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

// =============================================================================
// Typed fixture schemas
// =============================================================================

/// Expected sizes of a computed provenance.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedProvenance {
    pub clauses: usize,
    pub inputs: usize,
    pub outputs: usize,
}

/// One pruning scenario: a fact feed, the pruning switches, and the outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvenanceScenario {
    pub name: String,
    pub prune: bool,
    pub augment: bool,
    pub facts: StaticFacts,
    pub expected: ExpectedProvenance,
}

/// One observed tuple value inside a driver batch.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservedTuple {
    pub tuple: Tuple,
    pub value: bool,
}

/// A posterior expectation, checked with an absolute tolerance.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedMarginal {
    pub tuple: Tuple,
    pub probability: f64,
    pub tolerance: f64,
}

/// End-to-end driver scenario: facts, clause priors, observation batches.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverScenario {
    pub name: String,
    pub driver: String,
    pub facts: StaticFacts,
    /// Prior probability for every clause, keyed by rule id.
    pub rule_priors: Vec<f64>,
    /// Prior probability for every input tuple.
    pub input_prior: f64,
    pub batches: Vec<Vec<ObservedTuple>>,
    pub expected: Vec<ExpectedMarginal>,
}
