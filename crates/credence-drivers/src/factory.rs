//! Driver selection by name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use credence_causal::CausalGraph;
use credence_core::config::CredenceConfig;
use credence_core::errors::DriverError;
use credence_core::traits::CancellationToken;
use credence_factor::Solver;

use crate::driver::{CausalDriver, DriverContext, NodeKey};
use crate::dynaboost::DynaboostDriver;
use crate::em::EmDriver;
use crate::iterating::IteratingDriver;
use crate::oneshot::OneShotDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Iterating,
    OneShot,
    Em,
    Dynaboost,
}

impl DriverKind {
    pub const ALL: [DriverKind; 4] = [
        DriverKind::Iterating,
        DriverKind::OneShot,
        DriverKind::Em,
        DriverKind::Dynaboost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iterating => "iterating",
            Self::OneShot => "oneshot",
            Self::Em => "em",
            Self::Dynaboost => "dynaboost",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "iterating" => Ok(Self::Iterating),
            "oneshot" => Ok(Self::OneShot),
            "em" => Ok(Self::Em),
            "dynaboost" | "baseline" => Ok(Self::Dynaboost),
            other => Err(DriverError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Builds drivers that keep their artifacts under `<root>/<driver name>`.
#[derive(Debug, Clone)]
pub struct DriverFactory {
    root: PathBuf,
    template: DriverContext,
    default_kind: String,
}

impl DriverFactory {
    pub fn new(root: impl Into<PathBuf>, solver: Arc<dyn Solver>) -> Self {
        let root = root.into();
        Self {
            template: DriverContext::new(root.clone(), solver),
            root,
            default_kind: DriverKind::Iterating.to_string(),
        }
    }

    /// Work root, kind, and solver/compiler settings taken from `config`.
    pub fn from_config(config: &CredenceConfig, solver: Arc<dyn Solver>) -> Self {
        let root = PathBuf::from(config.driver.effective_work_dir());
        Self {
            template: DriverContext::from_config(root.clone(), solver, config),
            root,
            default_kind: config.driver.effective_kind().to_string(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.template.cancel = cancel;
        self
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Create a driver of the configured kind.
    pub fn create_default<N: NodeKey>(
        &self,
        name: &str,
        graph: &CausalGraph<N>,
    ) -> Result<Box<dyn CausalDriver<N>>, DriverError> {
        self.create(&self.default_kind, name, graph)
    }

    /// Unknown kinds fall back to an iterating driver.
    pub fn create<N: NodeKey>(
        &self,
        kind: &str,
        name: &str,
        graph: &CausalGraph<N>,
    ) -> Result<Box<dyn CausalDriver<N>>, DriverError> {
        let work_dir = self.root.join(name);
        std::fs::create_dir_all(&work_dir).map_err(|e| DriverError::WorkDir {
            path: work_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let kind = kind.parse::<DriverKind>().unwrap_or_else(|e| {
            tracing::error!(error = %e, driver = name, "unknown driver type, use iterating driver by default");
            DriverKind::Iterating
        });
        let mut ctx = self.template.clone();
        ctx.work_dir = work_dir;
        tracing::info!(driver = name, kind = %kind, work_dir = %ctx.work_dir.display(), "creating causal driver");

        let driver: Box<dyn CausalDriver<N>> = match kind {
            DriverKind::Iterating => Box::new(IteratingDriver::new(name, ctx, graph)),
            DriverKind::OneShot => Box::new(OneShotDriver::new(name, ctx, graph)),
            DriverKind::Em => Box::new(EmDriver::new(name, ctx, graph)),
            DriverKind::Dynaboost => Box::new(DynaboostDriver::new(name, ctx, graph)?),
        };
        Ok(driver)
    }
}
