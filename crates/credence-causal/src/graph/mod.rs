//! Causal graph structure, cycle checks, and text dumps.

pub mod acyclicity;
pub mod causal_graph;
pub mod dump;

pub use causal_graph::{CausalGraph, PriorTable};
