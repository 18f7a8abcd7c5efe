//! Structural learning: every observation round grows a chain of
//! differentiated replicas of the observed nodes, and the empirical
//! frequencies become priors on synthetic observation clauses.
//!
//! Real clause priors stay fixed at `rule_prob`. For round `r` and an
//! observed node `n` whose latest replica is `prev`:
//!
//! ```text
//! _DynaD<r>_<n>    = prod [prev]              prior rule_prob
//! _DynaT<r>_<n>    = sum  [_DynaD<r>_<n>]     new latest replica
//! _DynaOCls<r>_<n> = prod [prev]              prior freq(n, r)
//! _DynaO<r>_<n>    = sum  [_DynaOCls<r>_<n>]  observed true
//! ```
//!
//! Canonical products that read an observed node read its final replica.

use credence_causal::categorical::EPSILON;
use credence_causal::{Categorical01, CausalGraph};
use credence_core::errors::{DriverError, NetworkError};
use credence_core::types::collections::{FxHashMap, FxIndexMap};
use credence_factor::MetaNetwork;

use crate::driver::{
    node_id_of, retire_network, CausalDriver, DriverContext, DriverState, NodeKey, Observation,
};
use crate::factory::DriverKind;

/// Per-node observation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ObsCount {
    trues: u32,
    total: u32,
}

/// Synthetic nodes added for one observed node in one round.
#[derive(Debug)]
struct Family<N> {
    prev: usize,
    d: (usize, N),
    t: usize,
    ocls: (usize, N),
    o: usize,
    freq: f64,
}

#[derive(Debug)]
pub struct DynaboostDriver<N> {
    name: String,
    ctx: DriverContext,
    /// Canonical graph with every product at `rule_prob`.
    graph: CausalGraph<N>,
    counts: FxIndexMap<usize, ObsCount>,
    /// Per round, the observed nodes and their running true frequency.
    rounds: Vec<Vec<(usize, f64)>>,
    differentiated: Option<CausalGraph<N>>,
    network: Option<MetaNetwork>,
    state: DriverState,
}

impl<N: NodeKey> DynaboostDriver<N> {
    pub fn new(
        name: impl Into<String>,
        ctx: DriverContext,
        graph: &CausalGraph<N>,
    ) -> Result<Self, DriverError> {
        let mut canonical = graph.clone();
        canonical.reset_stoch_nodes();
        let heads: Vec<N> = graph
            .prods()
            .filter_map(|(head, _)| graph.node(head).cloned())
            .collect();
        for head in &heads {
            canonical.set_stoch_node(head, Categorical01::bernoulli(ctx.rule_prob)?);
        }
        Ok(Self {
            name: name.into(),
            ctx,
            graph: canonical,
            counts: FxIndexMap::default(),
            rounds: Vec::new(),
            differentiated: None,
            network: None,
            state: DriverState::Dirty,
        })
    }

    pub fn rounds(&self) -> usize {
        self.rounds.len()
    }

    /// The graph behind the current network, if one has been compiled.
    pub fn differentiated(&self) -> Option<&CausalGraph<N>> {
        self.differentiated.as_ref()
    }

    /// Canonical graph grown by one family per observed node per round.
    pub fn differentiate(&self) -> Result<CausalGraph<N>, DriverError> {
        let mut diff = self.graph.clone();
        diff.set_name(format!("{}_Dyna_{}", self.graph.name(), self.rounds.len()));

        let mut latest: FxHashMap<usize, usize> = FxHashMap::default();
        let mut families: Vec<Family<N>> = Vec::new();
        for (r, round) in self.rounds.iter().enumerate() {
            let r = r + 1;
            for &(node, freq) in round {
                let label = self
                    .graph
                    .node(node)
                    .map(ToString::to_string)
                    .ok_or_else(|| DriverError::UnknownNode {
                        node: node.to_string(),
                    })?;
                let prev = latest.get(&node).copied().unwrap_or(node);
                let d_name = N::from(format!("_DynaD{r}_{label}"));
                let d = diff.add_node(d_name.clone());
                let t = diff.add_node(N::from(format!("_DynaT{r}_{label}")));
                let ocls_name = N::from(format!("_DynaOCls{r}_{label}"));
                let ocls = diff.add_node(ocls_name.clone());
                let o = diff.add_node(N::from(format!("_DynaO{r}_{label}")));
                latest.insert(node, t);
                families.push(Family {
                    prev,
                    d: (d, d_name),
                    t,
                    ocls: (ocls, ocls_name),
                    o,
                    freq,
                });
            }
        }

        for (head, body) in self.graph.prods() {
            if body.iter().any(|sub| latest.contains_key(sub)) {
                let rewired = body
                    .iter()
                    .map(|sub| latest.get(sub).copied().unwrap_or(*sub))
                    .collect();
                diff.add_prod(head, rewired)?;
            }
        }

        for family in &families {
            diff.add_prod(family.d.0, vec![family.prev])?;
            diff.set_stoch_node(&family.d.1, Categorical01::bernoulli(self.ctx.rule_prob)?);
            diff.add_sum(family.t, vec![family.d.0])?;
            diff.add_prod(family.ocls.0, vec![family.prev])?;
            diff.set_stoch_node(&family.ocls.1, Categorical01::bernoulli(family.freq)?);
            diff.add_sum(family.o, vec![family.ocls.0])?;
        }
        diff.validate()?;

        tracing::debug!(
            graph = diff.name(),
            families = families.len(),
            nodes = diff.node_size(),
            "graph differentiated"
        );
        Ok(diff)
    }

    /// Ids of the `_DynaO` nodes in `diff`, in round order.
    fn observation_nodes(&self, diff: &CausalGraph<N>) -> Vec<usize> {
        let mut ids = Vec::new();
        for (r, round) in self.rounds.iter().enumerate() {
            for (node, _) in round {
                let Some(label) = self.graph.node(*node) else {
                    continue;
                };
                let o_name = N::from(format!("_DynaO{}_{label}", r + 1));
                if let Some(id) = diff.node_id(&o_name) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    fn refresh(&mut self) -> Result<&mut MetaNetwork, DriverError> {
        if self.state == DriverState::Dirty || self.network.is_none() {
            let _span = tracing::info_span!(
                "credence.driver_update",
                driver = %self.name,
                kind = "dynaboost",
                rounds = self.rounds.len()
            )
            .entered();

            self.ctx.check_cancelled()?;
            let diff = self.differentiate()?;
            self.network = None;
            let file_name = format!("{}_{}", self.name, self.rounds.len());
            let mut network = self.ctx.create_network(&file_name, &diff, 0, false)?;
            for o in self.observation_nodes(&diff) {
                network.observe_node(o, 0, true)?;
            }
            self.differentiated = Some(diff);
            self.network = Some(network);
            self.state = DriverState::Clean;
        }
        self.network.as_mut().ok_or_else(|| {
            DriverError::Network(NetworkError::Released {
                name: self.name.clone(),
            })
        })
    }
}

impl<N: NodeKey> CausalDriver<N> for DynaboostDriver<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Dynaboost
    }

    fn state(&self) -> DriverState {
        self.state
    }

    fn graph(&self) -> &CausalGraph<N> {
        &self.graph
    }

    fn context(&self) -> &DriverContext {
        &self.ctx
    }

    fn append_observation(&mut self, obs: &Observation<N>) {
        let mut round = Vec::with_capacity(obs.len());
        for (node, value) in obs {
            let Some(id) = self.graph.node_id(node) else {
                tracing::warn!(driver = %self.name, node = %node, "skipping observation on unknown node");
                continue;
            };
            let count = self.counts.entry(id).or_default();
            count.total += 1;
            if *value {
                count.trues += 1;
            }
            let freq = (f64::from(count.trues) / f64::from(count.total)).clamp(EPSILON, 1.0 - EPSILON);
            round.push((id, freq));
        }
        // the current network was compiled over the rounds before this one
        let file_name = format!("{:03}.query", self.rounds.len());
        retire_network(&mut self.network, &self.ctx.work_dir, &file_name);
        self.rounds.push(round);
        self.state = DriverState::Dirty;
    }

    fn query_marginal(&mut self, node: &N) -> Result<f64, DriverError> {
        let id = node_id_of(&self.graph, node)?;
        self.ctx.record_query(id, node);
        Ok(self.refresh()?.predict_node(id)?)
    }

    fn query_parameter_posterior(&mut self, dist_id: usize) -> Result<Vec<f64>, DriverError> {
        Ok(self.refresh()?.query_param_posterior(dist_id)?)
    }
}
