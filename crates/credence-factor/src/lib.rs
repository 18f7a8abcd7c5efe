//! # credence-factor
//!
//! Lowers causal graphs into replicated factor graphs, defines the solver
//! boundary, and addresses causal nodes inside a compiled network.
//!
//! The `.fg` text format written here is the only contract with a solver
//! backend. [`solver::ExactSolver`] is a dense reference backend that reads
//! the same files.

pub mod compiler;
pub mod factor;
pub mod network;
pub mod solver;

pub use compiler::{compile, FactorGraphSpec, VariableLayout};
pub use factor::Factor;
pub use network::MetaNetwork;
pub use solver::{CompiledNetwork, ExactSolver, Solver, SolverOptions};
