//! The boundary to inference backends.
//!
//! A backend loads a `.fg` file into a [`CompiledNetwork`] handle. Dropping
//! the handle releases whatever the backend holds for it.

mod exact;
pub mod parse;
mod table;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use credence_core::config::SolverConfig;
use credence_core::constants;
use credence_core::errors::SolverError;

pub use exact::ExactSolver;

/// Budgets and convergence settings for one loaded network.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub max_iter: u64,
    pub max_time_secs: u64,
    pub tolerance: f64,
    pub em_max_iterations: u32,
    pub max_table_entries: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: constants::DEFAULT_MAX_ITER,
            max_time_secs: constants::DEFAULT_MAX_TIME_SECS,
            tolerance: constants::DEFAULT_TOLERANCE,
            em_max_iterations: constants::DEFAULT_EM_MAX_ITERATIONS,
            max_table_entries: constants::DEFAULT_MAX_TABLE_ENTRIES,
        }
    }
}

impl SolverOptions {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            max_iter: config.effective_max_iter(),
            max_time_secs: config.effective_max_time_secs(),
            tolerance: config.effective_tolerance(),
            em_max_iterations: config.effective_em_max_iterations(),
            max_table_entries: config.effective_max_table_entries(),
        }
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.max_time_secs)
    }
}

/// An inference backend.
pub trait Solver: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn load(
        &self,
        fg_path: &Path,
        options: &SolverOptions,
    ) -> Result<Box<dyn CompiledNetwork>, SolverError>;
}

/// A loaded factor graph with bound evidence.
pub trait CompiledNetwork: fmt::Debug {
    fn num_vars(&self) -> usize;

    /// Clamp a binary variable.
    fn observe(&mut self, var: usize, value: bool) -> Result<(), SolverError>;

    /// Drop all evidence and inference state.
    fn reset(&mut self);

    fn run_bp(&mut self) -> Result<(), SolverError>;

    /// Fit the parameter factors named in `em_path` to the rows of `tab_path`.
    fn run_em(&mut self, tab_path: &Path, em_path: &Path) -> Result<(), SolverError>;

    /// `P(var = 1)` under the current evidence.
    fn query_marginal(&mut self, var: usize) -> Result<f64, SolverError>;

    /// Normalised belief over every state of `var`.
    fn query_factor(&mut self, var: usize) -> Result<Vec<f64>, SolverError>;
}
