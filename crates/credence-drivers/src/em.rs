//! Parameter fitting by expectation-maximization over the whole history.
//!
//! Batches are filtered before they are stored: a node forced to zero by
//! the graph structure can never be observed true, so such observations
//! are dropped as contradictory.

use credence_causal::CausalGraph;
use credence_core::errors::{DriverError, NetworkError};
use credence_core::types::collections::{FxHashMap, FxHashSet, FxIndexMap, FxIndexSet};
use credence_factor::MetaNetwork;

use crate::driver::{
    node_id_of, resolve_batch, retire_network, CausalDriver, DriverContext, DriverState, NodeKey,
    Observation,
};
use crate::factory::DriverKind;

#[derive(Debug)]
pub struct EmDriver<N> {
    name: String,
    ctx: DriverContext,
    graph: CausalGraph<N>,
    /// Body node to the products using it.
    rev_prod: FxHashMap<usize, Vec<usize>>,
    /// Body node to the sums using it.
    rev_sum: FxHashMap<usize, Vec<usize>>,
    history: Vec<Vec<(usize, bool)>>,
    network: Option<MetaNetwork>,
    state: DriverState,
}

impl<N: NodeKey> EmDriver<N> {
    pub fn new(name: impl Into<String>, ctx: DriverContext, graph: &CausalGraph<N>) -> Self {
        let mut rev_prod: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for (head, body) in graph.prods() {
            for sub in body {
                rev_prod.entry(*sub).or_default().push(head);
            }
        }
        let mut rev_sum: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for (head, body) in graph.sums() {
            for sub in body {
                rev_sum.entry(*sub).or_default().push(head);
            }
        }
        Self {
            name: name.into(),
            ctx,
            graph: graph.clone(),
            rev_prod,
            rev_sum,
            history: Vec::new(),
            network: None,
            state: DriverState::Dirty,
        }
    }

    /// Filtered batches, as handed to the solver.
    pub fn history(&self) -> &[Vec<(usize, bool)>] {
        &self.history
    }

    /// Drop true observations on nodes that the false observations force to zero.
    fn do_filter(&self, batch: Vec<(usize, bool)>) -> Vec<(usize, bool)> {
        let total = batch.len();
        let mut filtered: FxIndexMap<usize, bool> = batch.into_iter().collect();
        let mut workset: FxIndexSet<usize> = filtered
            .iter()
            .filter(|(_, value)| !**value)
            .map(|(node, _)| *node)
            .collect();
        let mut zero_prods: FxHashSet<usize> = FxHashSet::default();

        while !workset.is_empty() {
            let mut candidates: FxIndexSet<usize> = FxIndexSet::default();
            for zero in &workset {
                self.drop_contradiction(&mut filtered, *zero);
                for head in self.rev_prod.get(zero).into_iter().flatten() {
                    if zero_prods.insert(*head) {
                        self.drop_contradiction(&mut filtered, *head);
                        candidates.extend(self.rev_sum.get(head).into_iter().flatten().copied());
                    }
                }
            }
            workset = candidates
                .into_iter()
                .filter(|sum| {
                    self.graph
                        .sum(*sum)
                        .is_some_and(|body| body.iter().all(|b| zero_prods.contains(b)))
                })
                .collect();
        }

        tracing::info!(
            driver = %self.name,
            "applying {} / {} observation",
            filtered.len(),
            total
        );
        filtered.into_iter().collect()
    }

    fn drop_contradiction(&self, filtered: &mut FxIndexMap<usize, bool>, node: usize) {
        if filtered.get(&node) == Some(&true) {
            tracing::debug!(
                driver = %self.name,
                node,
                name = %self.graph.node(node).map(ToString::to_string).unwrap_or_default(),
                "removing contradictory observation"
            );
            filtered.shift_remove(&node);
        }
    }

    fn refresh(&mut self) -> Result<&mut MetaNetwork, DriverError> {
        if self.state == DriverState::Dirty || self.network.is_none() {
            let _span = tracing::info_span!(
                "credence.driver_update",
                driver = %self.name,
                kind = "em",
                batches = self.history.len()
            )
            .entered();

            // release first, the old network may hold a large table
            retire_network(&mut self.network, &self.ctx.work_dir, "em.query");
            let file_name = format!("em_{:03}", self.history.len());
            let mut network = self.ctx.create_network(&file_name, &self.graph, 0, false)?;
            if !self.history.is_empty() {
                network.run_em(&self.ctx.work_dir, &file_name, &self.history)?;
            }
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

impl<N: NodeKey> CausalDriver<N> for EmDriver<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Em
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
        let batch = resolve_batch(&self.name, &self.graph, obs);
        let filtered = self.do_filter(batch);
        self.history.push(filtered);
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
