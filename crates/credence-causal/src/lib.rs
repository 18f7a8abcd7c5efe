//! # credence-causal
//!
//! Causal graphs: every node is an input singleton, a disjunction (sum), or
//! a conjunction (product), optionally annotated with a categorical prior
//! over `[0,1]`.

pub mod categorical;
pub mod from_provenance;
pub mod graph;

pub use categorical::Categorical01;
pub use from_provenance::{from_provenance, from_provenance_tied};
pub use graph::{CausalGraph, PriorTable};
