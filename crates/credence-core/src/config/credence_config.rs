//! Top-level Credence configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CompilerConfig, DriverConfig, ProvenanceConfig, SolverConfig};
use crate::constants;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`CREDENCE_*`)
/// 3. Project config (`credence.toml` in project root)
/// 4. User config (`~/.credence/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredenceConfig {
    pub provenance: ProvenanceConfig,
    pub compiler: CompilerConfig,
    pub solver: SolverConfig,
    pub driver: DriverConfig,
}

/// Override arguments supplied by the embedding service.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub prune: Option<bool>,
    pub augment: Option<bool>,
    pub clause_limit: Option<usize>,
    pub driver_kind: Option<String>,
    pub work_dir: Option<String>,
}

impl CredenceConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(err @ ConfigError::ParseError { .. }) => return Err(err),
                    Err(err) => {
                        tracing::warn!(
                            path = %user_config_path.display(),
                            error = %err,
                            "ignoring unreadable user config"
                        );
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(constants::CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &CredenceConfig) -> Result<(), ConfigError> {
        if let Some(limit) = config.compiler.clause_limit {
            if !(2..=constants::MAX_CLAUSE_LIMIT).contains(&limit) {
                return Err(ConfigError::ValidationFailed {
                    field: "compiler.clause_limit".to_string(),
                    message: format!("must be between 2 and {}", constants::MAX_CLAUSE_LIMIT),
                });
            }
        }
        if let Some(p) = config.driver.rule_prob {
            if !(p > 0.0 && p < 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "driver.rule_prob".to_string(),
                    message: "must be strictly between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(tol) = config.solver.tolerance {
            if !(tol > 0.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "solver.tolerance".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if config.solver.max_table_entries == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "solver.max_table_entries".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".credence").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut CredenceConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let file_config: CredenceConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` win.
    fn merge(base: &mut CredenceConfig, other: &CredenceConfig) {
        // Provenance
        if other.provenance.prune.is_some() {
            base.provenance.prune = other.provenance.prune;
        }
        if other.provenance.augment.is_some() {
            base.provenance.augment = other.provenance.augment;
        }

        // Compiler
        if other.compiler.clause_limit.is_some() {
            base.compiler.clause_limit = other.compiler.clause_limit;
        }
        if other.compiler.dump_artifacts.is_some() {
            base.compiler.dump_artifacts = other.compiler.dump_artifacts;
        }

        // Solver
        if other.solver.max_iter.is_some() {
            base.solver.max_iter = other.solver.max_iter;
        }
        if other.solver.max_time_secs.is_some() {
            base.solver.max_time_secs = other.solver.max_time_secs;
        }
        if other.solver.tolerance.is_some() {
            base.solver.tolerance = other.solver.tolerance;
        }
        if other.solver.em_max_iterations.is_some() {
            base.solver.em_max_iterations = other.solver.em_max_iterations;
        }
        if other.solver.max_table_entries.is_some() {
            base.solver.max_table_entries = other.solver.max_table_entries;
        }

        // Driver
        if other.driver.kind.is_some() {
            base.driver.kind = other.driver.kind.clone();
        }
        if other.driver.rule_prob.is_some() {
            base.driver.rule_prob = other.driver.rule_prob;
        }
        if other.driver.work_dir.is_some() {
            base.driver.work_dir = other.driver.work_dir.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `CREDENCE_COMPILER_CLAUSE_LIMIT`, `CREDENCE_DRIVER_KIND`, etc.
    fn apply_env_overrides(config: &mut CredenceConfig) {
        if let Some(v) = env_parse::<bool>("CREDENCE_PROVENANCE_PRUNE") {
            config.provenance.prune = Some(v);
        }
        if let Some(v) = env_parse::<bool>("CREDENCE_PROVENANCE_AUGMENT") {
            config.provenance.augment = Some(v);
        }
        if let Some(v) = env_parse::<usize>("CREDENCE_COMPILER_CLAUSE_LIMIT") {
            config.compiler.clause_limit = Some(v);
        }
        if let Some(v) = env_parse::<bool>("CREDENCE_COMPILER_DUMP_ARTIFACTS") {
            config.compiler.dump_artifacts = Some(v);
        }
        if let Some(v) = env_parse::<u64>("CREDENCE_SOLVER_MAX_ITER") {
            config.solver.max_iter = Some(v);
        }
        if let Some(v) = env_parse::<u64>("CREDENCE_SOLVER_MAX_TIME_SECS") {
            config.solver.max_time_secs = Some(v);
        }
        if let Some(v) = env_parse::<f64>("CREDENCE_SOLVER_TOLERANCE") {
            config.solver.tolerance = Some(v);
        }
        if let Ok(val) = std::env::var("CREDENCE_DRIVER_KIND") {
            config.driver.kind = Some(val);
        }
        if let Some(v) = env_parse::<f64>("CREDENCE_DRIVER_RULE_PROB") {
            config.driver.rule_prob = Some(v);
        }
        if let Ok(val) = std::env::var("CREDENCE_DRIVER_WORK_DIR") {
            config.driver.work_dir = Some(val);
        }
    }

    fn apply_cli_overrides(config: &mut CredenceConfig, cli: &CliOverrides) {
        if let Some(v) = cli.prune {
            config.provenance.prune = Some(v);
        }
        if let Some(v) = cli.augment {
            config.provenance.augment = Some(v);
        }
        if let Some(v) = cli.clause_limit {
            config.compiler.clause_limit = Some(v);
        }
        if let Some(ref v) = cli.driver_kind {
            config.driver.kind = Some(v.clone());
        }
        if let Some(ref v) = cli.work_dir {
            config.driver.work_dir = Some(v.clone());
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
