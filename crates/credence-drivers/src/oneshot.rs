//! Unrolls the full observation history into one network; batch `t` binds
//! replica `t` and queries read replica 0.

use credence_causal::CausalGraph;
use credence_core::errors::{DriverError, NetworkError};
use credence_factor::MetaNetwork;

use crate::driver::{
    bind_batch, node_id_of, resolve_batch, CausalDriver, DriverContext, DriverState, NodeKey,
    Observation,
};
use crate::factory::DriverKind;

#[derive(Debug)]
pub struct OneShotDriver<N> {
    name: String,
    ctx: DriverContext,
    graph: CausalGraph<N>,
    history: Vec<Vec<(usize, bool)>>,
    network: Option<MetaNetwork>,
    state: DriverState,
}

impl<N: NodeKey> OneShotDriver<N> {
    pub fn new(name: impl Into<String>, ctx: DriverContext, graph: &CausalGraph<N>) -> Self {
        Self {
            name: name.into(),
            ctx,
            graph: graph.clone(),
            history: Vec::new(),
            network: None,
            state: DriverState::Dirty,
        }
    }

    pub fn history(&self) -> &[Vec<(usize, bool)>] {
        &self.history
    }

    fn refresh(&mut self) -> Result<&mut MetaNetwork, DriverError> {
        if self.state == DriverState::Dirty || self.network.is_none() {
            let _span = tracing::info_span!(
                "credence.driver_update",
                driver = %self.name,
                kind = "oneshot",
                batches = self.history.len()
            )
            .entered();

            self.network = None;
            let file_name = format!("{}_{}", self.name, self.history.len());
            let mut network =
                self.ctx
                    .create_network(&file_name, &self.graph, self.history.len(), true)?;
            for (t, batch) in self.history.iter().enumerate() {
                bind_batch(&mut network, batch, t + 1)?;
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

impl<N: NodeKey> CausalDriver<N> for OneShotDriver<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DriverKind {
        DriverKind::OneShot
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
        self.history.push(batch);
        self.network = None;
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
