//! Binds causal-graph nodes to the variables of a compiled factor graph.
//!
//! Parameter `d` is variable `d`; node `n` observed at time `t` is variable
//! `offset + t * shift + n`; predictions always read replica 0.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use credence_causal::CausalGraph;
use credence_core::config::CompilerConfig;
use credence_core::errors::NetworkError;
use credence_core::types::collections::{FxIndexMap, FxIndexSet};

use crate::compiler::{self, write_em, write_tab};
use crate::solver::{CompiledNetwork, Solver, SolverOptions};

pub struct MetaNetwork {
    name: String,
    fg_path: PathBuf,
    node_size: usize,
    offset: usize,
    shift: usize,
    num_repeats: usize,
    handle: Option<Box<dyn CompiledNetwork>>,
    activated: bool,
    /// Latest answer per predicted node, in first-query order.
    queries: FxIndexMap<usize, f64>,
}

impl fmt::Debug for MetaNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaNetwork")
            .field("name", &self.name)
            .field("fg_path", &self.fg_path)
            .field("offset", &self.offset)
            .field("shift", &self.shift)
            .field("num_repeats", &self.num_repeats)
            .field("loaded", &self.handle.is_some())
            .finish()
    }
}

impl MetaNetwork {
    /// Compile `graph` to `<dir>/<name>.fg` and load it with `solver`.
    #[allow(clippy::too_many_arguments)]
    pub fn create<N>(
        solver: &dyn Solver,
        dir: &Path,
        name: &str,
        graph: &CausalGraph<N>,
        num_repeats: usize,
        bayes: bool,
        compiler_config: &CompilerConfig,
        options: &SolverOptions,
    ) -> Result<Self, NetworkError> {
        let spec = compiler::compile(graph, num_repeats, bayes, compiler_config)?;
        let fg_path = dir.join(format!("{name}.fg"));
        spec.write_fg(&fg_path)?;
        let handle = solver.load(&fg_path, options)?;
        let layout = spec.layout();
        tracing::debug!(
            network = name,
            solver = solver.name(),
            factors = spec.num_factors(),
            "meta-network created"
        );
        Ok(Self {
            name: name.to_string(),
            fg_path,
            node_size: graph.node_size(),
            offset: layout.dist_size(),
            shift: layout.shift(),
            num_repeats,
            handle: Some(handle),
            activated: false,
            queries: FxIndexMap::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fg_path(&self) -> &Path {
        &self.fg_path
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn shift(&self) -> usize {
        self.shift
    }

    pub fn num_repeats(&self) -> usize {
        self.num_repeats
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    fn handle(&mut self) -> Result<&mut Box<dyn CompiledNetwork>, NetworkError> {
        self.handle.as_mut().ok_or_else(|| NetworkError::Released {
            name: self.name.clone(),
        })
    }

    fn check_node(&self, node: usize) -> Result<(), NetworkError> {
        if node >= self.node_size {
            return Err(NetworkError::NodeOutOfRange {
                node,
                size: self.node_size,
            });
        }
        Ok(())
    }

    fn activate(&mut self) -> Result<(), NetworkError> {
        if !self.activated {
            self.handle()?.run_bp()?;
            self.activated = true;
        }
        Ok(())
    }

    /// Bind node `node` of replica `time` to `value`. All evidence must be
    /// bound before the first query.
    pub fn observe_node(&mut self, node: usize, time: usize, value: bool) -> Result<(), NetworkError> {
        self.check_node(node)?;
        if time > self.num_repeats {
            return Err(NetworkError::TimeOutOfRange {
                time,
                horizon: self.num_repeats,
            });
        }
        if self.activated {
            return Err(NetworkError::AlreadyActivated {
                name: self.name.clone(),
            });
        }
        let var = self.offset + time * self.shift + node;
        tracing::trace!(var, node, time, value, "observing node");
        self.handle()?.observe(var, value)?;
        Ok(())
    }

    /// `P(node = 1)` in replica 0, running inference first if needed.
    pub fn predict_node(&mut self, node: usize) -> Result<f64, NetworkError> {
        self.check_node(node)?;
        self.activate()?;
        let var = self.offset + node;
        let p = self.handle()?.query_marginal(var)?;
        self.queries.insert(node, p);
        Ok(p)
    }

    /// Nodes predicted so far with their latest probability.
    pub fn queries(&self) -> &FxIndexMap<usize, f64> {
        &self.queries
    }

    /// Write `node\tprobability` per predicted node to `path`. Failures are
    /// logged and skipped.
    pub fn dump_queries(&self, path: &Path) {
        match self.write_queries(path) {
            Ok(()) => tracing::debug!(
                network = %self.name,
                path = %path.display(),
                queries = self.queries.len(),
                "queries dumped"
            ),
            Err(e) => tracing::error!(
                network = %self.name,
                path = %path.display(),
                error = %e,
                "failed to dump queries, skip"
            ),
        }
    }

    fn write_queries(&self, path: &Path) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for (node, p) in &self.queries {
            writeln!(w, "{node}\t{p}")?;
        }
        w.flush()
    }

    /// Posterior belief over the states of parameter `dist`.
    pub fn query_param_posterior(&mut self, dist: usize) -> Result<Vec<f64>, NetworkError> {
        if dist >= self.offset {
            return Err(NetworkError::NotAParameter {
                id: dist,
                count: self.offset,
            });
        }
        self.activate()?;
        Ok(self.handle()?.query_factor(dist)?)
    }

    /// Write `<dir>/<name>.tab` and `<dir>/<name>.em` from `history` and fit
    /// every parameter. Rows list `(node, value)` pairs; the header keeps
    /// first-seen node order.
    pub fn run_em(
        &mut self,
        dir: &Path,
        name: &str,
        history: &[Vec<(usize, bool)>],
    ) -> Result<(), NetworkError> {
        if self.activated {
            tracing::warn!(network = %self.name, "EM already ran on this network, running again");
        }
        let mut nodes: FxIndexSet<usize> = FxIndexSet::default();
        for row in history {
            for (node, _) in row {
                self.check_node(*node)?;
                nodes.insert(*node);
            }
        }
        let header: Vec<usize> = nodes.iter().map(|n| n + self.offset).collect();
        let rows: Vec<Vec<Option<bool>>> = history
            .iter()
            .map(|row| {
                let mut fields = vec![None; nodes.len()];
                for (node, value) in row {
                    if let Some(i) = nodes.get_index_of(node) {
                        fields[i] = Some(*value);
                    }
                }
                fields
            })
            .collect();

        let tab_path = dir.join(format!("{name}.tab"));
        let em_path = dir.join(format!("{name}.em"));
        write_tab(&tab_path, &header, &rows)?;
        let params: Vec<usize> = (0..self.offset).collect();
        write_em(&em_path, &params)?;
        tracing::info!(
            network = %self.name,
            tab = %tab_path.display(),
            rows = rows.len(),
            params = params.len(),
            "running EM"
        );
        self.handle()?.run_em(&tab_path, &em_path)?;
        self.activated = true;
        Ok(())
    }

    /// Drop the backend handle. Later calls are no-ops.
    pub fn release(&mut self) {
        if self.handle.take().is_some() {
            tracing::debug!(network = %self.name, "meta-network released");
        }
        self.activated = false;
    }
}

impl Drop for MetaNetwork {
    fn drop(&mut self) {
        self.release();
    }
}
