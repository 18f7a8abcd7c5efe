//! The driver trait and the settings every driver shares.

use std::fmt;
use std::hash::Hash;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use credence_causal::CausalGraph;
use credence_core::config::{CompilerConfig, CredenceConfig};
use credence_core::constants;
use credence_core::errors::DriverError;
use credence_core::traits::{Cancellable, CancellationToken};
use credence_core::types::collections::FxIndexMap;
use credence_factor::{MetaNetwork, Solver, SolverOptions};
use indexmap::IndexMap;

use crate::factory::DriverKind;

/// Node names a driver can address and synthesize.
///
/// `From<String>` is needed by Dynaboost, which adds nodes to its
/// working copy of the graph.
pub trait NodeKey: Clone + Eq + Hash + fmt::Display + From<String> + 'static {}

impl<T> NodeKey for T where T: Clone + Eq + Hash + fmt::Display + From<String> + 'static {}

/// One observation batch, in the order the values were recorded.
pub type Observation<N> = IndexMap<N, bool>;

/// `Dirty` until a compiled network reflects every appended batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Dirty,
    Clean,
}

/// Settings shared by every driver instance.
#[derive(Debug, Clone)]
pub struct DriverContext {
    /// Per-driver artifact directory; must already exist.
    pub work_dir: PathBuf,
    pub solver: Arc<dyn Solver>,
    pub compiler: CompilerConfig,
    pub solver_options: SolverOptions,
    /// Fixed clause probability used by Dynaboost.
    pub rule_prob: f64,
    pub cancel: CancellationToken,
    /// Every node queried through this driver, by id, in first-query order.
    queried: FxIndexMap<usize, String>,
}

impl DriverContext {
    pub fn new(work_dir: impl Into<PathBuf>, solver: Arc<dyn Solver>) -> Self {
        Self {
            work_dir: work_dir.into(),
            solver,
            compiler: CompilerConfig::default(),
            solver_options: SolverOptions::default(),
            rule_prob: constants::DEFAULT_RULE_PROB,
            cancel: CancellationToken::new(),
            queried: FxIndexMap::default(),
        }
    }

    pub fn from_config(
        work_dir: impl Into<PathBuf>,
        solver: Arc<dyn Solver>,
        config: &CredenceConfig,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            solver,
            compiler: config.compiler.clone(),
            solver_options: SolverOptions::from_config(&config.solver),
            rule_prob: config.driver.effective_rule_prob(),
            cancel: CancellationToken::new(),
            queried: FxIndexMap::default(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn queried(&self) -> &FxIndexMap<usize, String> {
        &self.queried
    }

    pub(crate) fn record_query(&mut self, node_id: usize, node: &impl fmt::Display) {
        self.queried
            .entry(node_id)
            .or_insert_with(|| node.to_string());
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), DriverError> {
        if self.cancel.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        Ok(())
    }

    /// Compile `graph` into `<work_dir>/<file_name>.fg` and load it.
    pub(crate) fn create_network<N>(
        &self,
        file_name: &str,
        graph: &CausalGraph<N>,
        num_repeats: usize,
        bayes: bool,
    ) -> Result<MetaNetwork, DriverError> {
        self.check_cancelled()?;
        if self.compiler.effective_dump_artifacts() {
            graph.dump(&self.work_dir);
        }
        let network = MetaNetwork::create(
            self.solver.as_ref(),
            &self.work_dir,
            file_name,
            graph,
            num_repeats,
            bayes,
            &self.compiler,
            &self.solver_options,
        )?;
        Ok(network)
    }
}

/// A strategy turning observation batches into posterior queries.
///
/// Appending never compiles; the first query after an append does.
pub trait CausalDriver<N: NodeKey> {
    fn name(&self) -> &str;

    fn kind(&self) -> DriverKind;

    fn state(&self) -> DriverState;

    /// The driver's own copy of the graph.
    fn graph(&self) -> &CausalGraph<N>;

    fn context(&self) -> &DriverContext;

    fn append_observation(&mut self, obs: &Observation<N>);

    fn append_observations(&mut self, batches: &[Observation<N>]) {
        for batch in batches {
            self.append_observation(batch);
        }
    }

    /// `P(node = 1)` given every batch appended so far.
    fn query_marginal(&mut self, node: &N) -> Result<f64, DriverError>;

    /// Marginals for the known nodes among `nodes`; unknown ones are skipped.
    fn query_possibilities(&mut self, nodes: &[N]) -> Result<IndexMap<N, f64>, DriverError> {
        let mut results = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            if self.graph().node_id(node).is_none() {
                tracing::debug!(driver = self.name(), node = %node, "skipping query on unknown node");
                continue;
            }
            let p = self.query_marginal(node)?;
            results.insert(node.clone(), p);
        }
        Ok(results)
    }

    fn query_parameter_posterior(&mut self, dist_id: usize) -> Result<Vec<f64>, DriverError>;
}

pub(crate) fn node_id_of<N: NodeKey>(graph: &CausalGraph<N>, node: &N) -> Result<usize, DriverError> {
    graph.node_id(node).ok_or_else(|| DriverError::UnknownNode {
        node: node.to_string(),
    })
}

/// Resolve a batch to node ids. Instrumentation may report nodes the
/// derivation never reached; those are dropped.
pub(crate) fn resolve_batch<N: NodeKey>(
    driver: &str,
    graph: &CausalGraph<N>,
    obs: &Observation<N>,
) -> Vec<(usize, bool)> {
    obs.iter()
        .filter_map(|(node, value)| match graph.node_id(node) {
            Some(id) => Some((id, *value)),
            None => {
                tracing::debug!(driver, node = %node, "skipping observation on unknown node");
                None
            }
        })
        .collect()
}

pub(crate) fn bind_batch(
    network: &mut MetaNetwork,
    batch: &[(usize, bool)],
    time: usize,
) -> Result<(), DriverError> {
    for (node, value) in batch {
        network.observe_node(*node, time, *value)?;
    }
    Ok(())
}

/// Dump the queries `network` answered to `<work_dir>/<file_name>` and
/// release it.
pub(crate) fn retire_network(network: &mut Option<MetaNetwork>, work_dir: &Path, file_name: &str) {
    if let Some(mut old) = network.take() {
        old.dump_queries(&work_dir.join(file_name));
        old.release();
    }
}

/// Rank every previously queried node under the evidence bound to `network`
/// and write `id\tprobability\tname` lines, highest first, to
/// `<work_dir>/<file_name>`. Write failures are logged and skipped.
pub(crate) fn dump_local_ranking(
    ctx: &DriverContext,
    network: &mut MetaNetwork,
    file_name: &str,
) -> Result<(), DriverError> {
    let mut ranking = Vec::with_capacity(ctx.queried.len());
    for (node, name) in &ctx.queried {
        ranking.push((*node, network.predict_node(*node)?, name.as_str()));
    }
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1));

    let path = ctx.work_dir.join(file_name);
    match write_ranking(&path, &ranking) {
        Ok(()) => tracing::debug!(path = %path.display(), nodes = ranking.len(), "local ranking dumped"),
        Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to dump local ranking, skip"),
    }
    Ok(())
}

fn write_ranking(path: &Path, ranking: &[(usize, f64, &str)]) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for (node, p, name) in ranking {
        writeln!(w, "{node}\t{p}\t{name}")?;
    }
    w.flush()
}

/// Overwrite every distribution of `graph` with its posterior in `network`.
/// On error the graph is left untouched.
pub fn update_all_factors<N>(
    graph: &mut CausalGraph<N>,
    network: &mut MetaNetwork,
) -> Result<(), DriverError> {
    let mut updated = Vec::with_capacity(graph.dist_size());
    for (dist_id, dist) in graph.distributions().iter().enumerate() {
        let posterior = network.query_param_posterior(dist_id)?;
        let mut dist = dist.clone();
        dist.update_probs(&posterior)?;
        updated.push(dist);
    }
    for (slot, dist) in graph.distributions_mut().iter_mut().zip(updated) {
        *slot = dist;
    }
    tracing::debug!(
        graph = graph.name(),
        dists = graph.dist_size(),
        "distributions updated from posterior"
    );
    Ok(())
}
