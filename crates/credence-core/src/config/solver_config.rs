//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Budget and convergence settings handed to the solver backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum BP iterations. Default: 10_000_000.
    pub max_iter: Option<u64>,
    /// Wall-clock budget per solve in seconds. Default: 10_800.
    pub max_time_secs: Option<u64>,
    /// Convergence tolerance. Default: 1e-6.
    pub tolerance: Option<f64>,
    /// Maximum EM rounds. Default: 500.
    pub em_max_iterations: Option<u32>,
    /// Dense table size cap for the exact backend. Default: 4_194_304.
    pub max_table_entries: Option<usize>,
}

impl SolverConfig {
    pub fn effective_max_iter(&self) -> u64 {
        self.max_iter.unwrap_or(constants::DEFAULT_MAX_ITER)
    }

    pub fn effective_max_time_secs(&self) -> u64 {
        self.max_time_secs
            .unwrap_or(constants::DEFAULT_MAX_TIME_SECS)
    }

    pub fn effective_tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(constants::DEFAULT_TOLERANCE)
    }

    pub fn effective_em_max_iterations(&self) -> u32 {
        self.em_max_iterations
            .unwrap_or(constants::DEFAULT_EM_MAX_ITERATIONS)
    }

    pub fn effective_max_table_entries(&self) -> usize {
        self.max_table_entries
            .unwrap_or(constants::DEFAULT_MAX_TABLE_ENTRIES)
    }
}
