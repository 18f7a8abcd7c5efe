//! Online updating: every batch is inferred on its own and the posterior
//! replaces the graph's priors before the next batch.
//!
//! Update `k` compiles `<k>.post.fg` and ranks earlier queries under its
//! evidence in `<k>.local.list`. A replaced network dumps its answers to
//! `<k>.query`.

use std::collections::VecDeque;

use credence_causal::CausalGraph;
use credence_core::errors::{DriverError, NetworkError};
use credence_factor::MetaNetwork;

use crate::driver::{
    bind_batch, dump_local_ranking, node_id_of, resolve_batch, retire_network,
    update_all_factors, CausalDriver, DriverContext, DriverState, NodeKey, Observation,
};
use crate::factory::DriverKind;

#[derive(Debug)]
pub struct IteratingDriver<N> {
    name: String,
    ctx: DriverContext,
    graph: CausalGraph<N>,
    pending: VecDeque<Vec<(usize, bool)>>,
    network: Option<MetaNetwork>,
    update_count: usize,
    state: DriverState,
}

impl<N: NodeKey> IteratingDriver<N> {
    pub fn new(name: impl Into<String>, ctx: DriverContext, graph: &CausalGraph<N>) -> Self {
        Self {
            name: name.into(),
            ctx,
            graph: graph.clone(),
            pending: VecDeque::new(),
            network: None,
            update_count: 0,
            state: DriverState::Dirty,
        }
    }

    /// Batches applied to the priors so far.
    pub fn update_count(&self) -> usize {
        self.update_count
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The current network always belongs to update `update_count`.
    fn retire(&mut self) {
        let file_name = format!("{:03}.query", self.update_count);
        retire_network(&mut self.network, &self.ctx.work_dir, &file_name);
    }

    fn refresh(&mut self) -> Result<&mut MetaNetwork, DriverError> {
        if self.state == DriverState::Dirty || self.network.is_none() {
            let _span = tracing::info_span!(
                "credence.driver_update",
                driver = %self.name,
                kind = "iterating",
                pending = self.pending.len()
            )
            .entered();

            if self.pending.is_empty() {
                self.retire();
                let file_name = format!("{:03}.post", self.update_count);
                self.network = Some(self.ctx.create_network(&file_name, &self.graph, 0, true)?);
            }
            while let Some(batch) = self.pending.front() {
                retire_network(
                    &mut self.network,
                    &self.ctx.work_dir,
                    &format!("{:03}.query", self.update_count),
                );
                let update = self.update_count + 1;
                let mut network =
                    self.ctx
                        .create_network(&format!("{update:03}.post"), &self.graph, 0, true)?;
                bind_batch(&mut network, batch, 0)?;
                dump_local_ranking(&self.ctx, &mut network, &format!("{update:03}.local.list"))?;
                update_all_factors(&mut self.graph, &mut network)?;
                self.pending.pop_front();
                self.update_count += 1;
                self.network = Some(network);
            }
            self.state = DriverState::Clean;
            tracing::info!(updates = self.update_count, "iterating update finished");
        }
        self.network.as_mut().ok_or_else(|| {
            DriverError::Network(NetworkError::Released {
                name: self.name.clone(),
            })
        })
    }
}

impl<N: NodeKey> CausalDriver<N> for IteratingDriver<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Iterating
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
        self.pending.push_back(batch);
        self.retire();
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
