//! Lowering of a causal graph into a replicated factor graph.
//!
//! Factor order is fixed: one factor per distribution, then per replica the
//! latents, the sums (phonies first, then the head), the products, and the
//! singletons. Every variable owns exactly one factor.

mod decompose;
pub mod layout;
pub mod writer;

use credence_causal::{Categorical01, CausalGraph};
use credence_core::config::CompilerConfig;
use credence_core::errors::CompileError;
use credence_core::types::collections::FxIndexSet;
use tracing::instrument;

use crate::factor::{self, Factor};
use decompose::{decompose, ClauseKind, Slot};

pub use layout::VariableLayout;
pub use writer::{write_em, write_tab};

pub use credence_core::constants::MAX_CLAUSE_LIMIT;

/// A compiled graph: parameter factors plus the template of one replica.
#[derive(Debug, Clone)]
pub struct FactorGraphSpec {
    layout: VariableLayout,
    params: Vec<Factor>,
    block: Vec<Factor<Slot>>,
}

impl FactorGraphSpec {
    pub fn layout(&self) -> &VariableLayout {
        &self.layout
    }

    pub fn num_factors(&self) -> usize {
        self.params.len() + self.block.len() * (self.layout.num_repeats + 1)
    }

    /// All factors in file order, with replica ids resolved.
    pub fn factors(&self) -> impl Iterator<Item = Factor> + '_ {
        let replicas = (0..=self.layout.num_repeats).flat_map(move |r| {
            let offset = self.layout.offset(r);
            self.block
                .iter()
                .map(move |f| f.map_vars(|slot| slot.resolve(offset)))
        });
        self.params.iter().cloned().chain(replicas)
    }
}

/// Compile `graph` into `num_repeats + 1` replicas.
///
/// In Bayesian mode parameters carry the full categorical prior and each
/// stochastic clause is gated through a latent Bernoulli; in direct mode
/// parameters are binary with the prior mean and gate clauses themselves.
#[instrument(
    name = "credence.compile",
    skip(graph, config),
    fields(graph = graph.name())
)]
pub fn compile<N>(
    graph: &CausalGraph<N>,
    num_repeats: usize,
    bayes: bool,
    config: &CompilerConfig,
) -> Result<FactorGraphSpec, CompileError> {
    let clause_limit = config.effective_clause_limit();
    if !(2..=MAX_CLAUSE_LIMIT).contains(&clause_limit) {
        return Err(CompileError::InvalidClauseLimit {
            limit: clause_limit,
        });
    }

    let latents: FxIndexSet<usize> = (0..graph.node_size())
        .filter(|n| graph.is_stoch_node(*n) && !graph.is_singleton(*n))
        .collect();

    let params = graph
        .distributions()
        .iter()
        .enumerate()
        .map(|(d, dist)| {
            if bayes {
                factor::categorical(d, dist.probabilities())
            } else {
                let e = dist.estimation();
                factor::categorical(d, &[1.0 - e, e])
            }
        })
        .collect();

    let phony_base = graph.node_size() + if bayes { latents.len() } else { 0 };
    let mut builder = BlockBuilder {
        graph,
        latents: &latents,
        bayes,
        clause_limit,
        phony_base,
        next_phony: phony_base,
        block: Vec::new(),
    };
    builder.build()?;
    let phony_count = builder.next_phony - builder.phony_base;
    let block = builder.block;

    let layout = VariableLayout {
        dist_size: graph.dist_size(),
        node_count: graph.node_size(),
        latents,
        phony_count,
        bayes,
        num_repeats,
    };
    debug_assert_eq!(block.len(), layout.shift());
    tracing::debug!(
        dists = layout.dist_size,
        nodes = layout.node_count,
        latents = layout.allocated_latents(),
        phonies = phony_count,
        num_repeats,
        bayes,
        "factor graph compiled"
    );
    Ok(FactorGraphSpec {
        layout,
        params,
        block,
    })
}

struct BlockBuilder<'a, N> {
    graph: &'a CausalGraph<N>,
    latents: &'a FxIndexSet<usize>,
    bayes: bool,
    clause_limit: usize,
    phony_base: usize,
    next_phony: usize,
    block: Vec<Factor<Slot>>,
}

impl<'a, N> BlockBuilder<'a, N> {
    fn build(&mut self) -> Result<(), CompileError> {
        let graph = self.graph;
        let node_count = graph.node_size();

        if self.bayes {
            for (i, node) in self.latents.iter().enumerate() {
                let (dist_id, dist) = self.dist_of(*node)?;
                self.block.push(factor::bernoulli(
                    Slot::Local(node_count + i),
                    Slot::Param(dist_id),
                    dist.supports(),
                ));
            }
        }

        for (head, body) in graph.sums() {
            self.clause(head, body, ClauseKind::Or)?;
        }
        for (head, body) in graph.prods() {
            self.clause(head, body, ClauseKind::And)?;
        }

        for node in graph.singletons() {
            let factor = match graph.dist_id_of(node) {
                Some(_) => {
                    let (dist_id, dist) = self.dist_of(node)?;
                    let supports: &[f64] = if self.bayes {
                        dist.supports()
                    } else {
                        &[0.0, 1.0]
                    };
                    factor::bernoulli(Slot::Local(node), Slot::Param(dist_id), supports)
                }
                None => factor::constant_true(Slot::Local(node)),
            };
            self.block.push(factor);
        }
        Ok(())
    }

    fn clause(&mut self, head: usize, body: &[usize], kind: ClauseKind) -> Result<(), CompileError> {
        let control = match self.latents.get_index_of(&head) {
            None => None,
            Some(i) if self.bayes => Some(Slot::Local(self.graph.node_size() + i)),
            Some(_) => Some(Slot::Param(self.dist_of(head)?.0)),
        };
        let limit = if control.is_some() {
            self.clause_limit - 1
        } else {
            self.clause_limit
        };
        let body = decompose(
            body.iter().copied().map(Slot::Local).collect(),
            limit,
            self.clause_limit,
            kind,
            &mut self.next_phony,
            &mut self.block,
        );
        self.block.push(kind.factor(Slot::Local(head), control, body));
        Ok(())
    }

    fn dist_of(&self, node: usize) -> Result<(usize, &'a Categorical01), CompileError> {
        let graph = self.graph;
        graph
            .dist_id_of(node)
            .and_then(|d| graph.distributions().get(d).map(|dist| (d, dist)))
            .ok_or_else(|| CompileError::MissingDistribution {
                node,
                dist: graph.dist_id_of(node).unwrap_or(graph.dist_size()),
            })
    }
}
