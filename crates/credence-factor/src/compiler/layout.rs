//! Variable numbering of a replicated factor graph.

use credence_core::types::collections::FxIndexSet;

/// Where every parameter, node, latent, and phony variable lives.
///
/// Ids `[0, dist_size)` are parameters. Replica `r` occupies
/// `[offset(r), offset(r) + shift)`: nodes first, then latents (Bayesian
/// mode only), then phony heads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    pub(crate) dist_size: usize,
    pub(crate) node_count: usize,
    pub(crate) latents: FxIndexSet<usize>,
    pub(crate) phony_count: usize,
    pub(crate) bayes: bool,
    pub(crate) num_repeats: usize,
}

impl VariableLayout {
    pub fn dist_size(&self) -> usize {
        self.dist_size
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Stochastic non-singleton nodes, in node order. Tracked in both modes.
    pub fn latents(&self) -> &FxIndexSet<usize> {
        &self.latents
    }

    pub fn phony_count(&self) -> usize {
        self.phony_count
    }

    pub fn is_bayes(&self) -> bool {
        self.bayes
    }

    pub fn num_repeats(&self) -> usize {
        self.num_repeats
    }

    /// Latent variables actually allocated per replica.
    pub fn allocated_latents(&self) -> usize {
        if self.bayes {
            self.latents.len()
        } else {
            0
        }
    }

    /// Variables per replica block.
    pub fn shift(&self) -> usize {
        self.allocated_latents() + self.node_count + self.phony_count
    }

    pub fn offset(&self, replica: usize) -> usize {
        self.dist_size + replica * self.shift()
    }

    pub fn node_var(&self, replica: usize, node: usize) -> usize {
        self.offset(replica) + node
    }

    /// `None` in direct mode or for a node without a latent.
    pub fn latent_var(&self, replica: usize, node: usize) -> Option<usize> {
        if !self.bayes {
            return None;
        }
        self.latents
            .get_index_of(&node)
            .map(|i| self.offset(replica) + self.node_count + i)
    }

    pub fn phony_var(&self, replica: usize, phony: usize) -> usize {
        self.offset(replica) + self.node_count + self.allocated_latents() + phony
    }

    /// Every variable owns exactly one factor, so this is also the variable count.
    pub fn num_factors(&self) -> usize {
        self.dist_size + self.shift() * (self.num_repeats + 1)
    }
}
