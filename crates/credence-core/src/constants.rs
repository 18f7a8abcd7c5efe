//! Shared constants and compiled defaults.

/// Credence version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project config file name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "credence.toml";

/// Environment variable carrying per-crate log directives.
pub const LOG_ENV_VAR: &str = "CREDENCE_LOG";

/// Fallback log directive when `CREDENCE_LOG` is unset or invalid.
pub const DEFAULT_LOG_DIRECTIVE: &str = "credence=info";

// Provenance
pub const DEFAULT_PRUNE: bool = true;
pub const DEFAULT_AUGMENT: bool = true;

// Compiler
/// Maximum variable count a solver factor may carry before phony decomposition.
pub const DEFAULT_CLAUSE_LIMIT: usize = 4;
/// Widest clause a factor may carry; keeps joint-state indices inside `u64`.
pub const MAX_CLAUSE_LIMIT: usize = 62;
pub const DEFAULT_DUMP_ARTIFACTS: bool = false;

// Solver
pub const DEFAULT_MAX_ITER: u64 = 10_000_000;
pub const DEFAULT_MAX_TIME_SECS: u64 = 10_800;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_EM_MAX_ITERATIONS: u32 = 500;
/// Upper bound on dense table entries held by the exact backend.
pub const DEFAULT_MAX_TABLE_ENTRIES: usize = 1 << 22;

// Drivers
pub const DEFAULT_DRIVER_KIND: &str = "iterating";
pub const DEFAULT_RULE_PROB: f64 = 0.999;
pub const DEFAULT_WORK_DIR: &str = "credence-out";

/// Distribution resolution used by clamping and slot bucketing.
pub const PROB_EPSILON: f64 = 1.0 / 1024.0;
pub const PROB_NUM_SLOTS: usize = 64;
