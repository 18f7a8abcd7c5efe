//! Arena-backed sum/product network with tied distribution parameters.

use std::fmt;
use std::hash::Hash;

use credence_core::errors::GraphError;
use credence_core::types::collections::{FxHashMap, FxIndexMap, FxIndexSet};

use crate::categorical::Categorical01;

/// Distributions plus the nodes they are attached to.
///
/// Assigning two nodes the same distribution index ties them to one
/// shared parameter.
#[derive(Debug, Clone)]
pub struct PriorTable<N> {
    dists: Vec<Categorical01>,
    assignments: Vec<(N, usize)>,
}

impl<N> Default for PriorTable<N> {
    fn default() -> Self {
        Self {
            dists: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

impl<N> PriorTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a fresh distribution to `node`; returns its index.
    pub fn add(&mut self, node: N, dist: Categorical01) -> usize {
        self.dists.push(dist);
        let id = self.dists.len() - 1;
        self.assignments.push((node, id));
        id
    }

    /// Attach an already-added distribution to another node.
    pub fn tie(&mut self, node: N, dist_id: usize) -> Result<(), GraphError> {
        if dist_id >= self.dists.len() {
            return Err(GraphError::DistOutOfRange {
                id: dist_id,
                size: self.dists.len(),
            });
        }
        self.assignments.push((node, dist_id));
        Ok(())
    }

    pub fn dists(&self) -> &[Categorical01] {
        &self.dists
    }

    pub fn assignments(&self) -> &[(N, usize)] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// A causal graph over node names `N`.
///
/// Nodes are addressed by dense ids in insertion order. After a successful
/// [`CausalGraph::build`] every node is exactly one of singleton, sum, or
/// product, and no body references its own head.
#[derive(Debug, Clone)]
pub struct CausalGraph<N> {
    name: String,
    nodes: FxIndexSet<N>,
    singletons: FxIndexSet<usize>,
    sums: FxIndexMap<usize, Vec<usize>>,
    prods: FxIndexMap<usize, Vec<usize>>,
    dists: Vec<Categorical01>,
    stoch: FxHashMap<usize, usize>,
}

impl<N> CausalGraph<N>
where
    N: Clone + Eq + Hash + fmt::Display,
{
    pub fn build(
        name: impl Into<String>,
        nodes: impl IntoIterator<Item = N>,
        singletons: impl IntoIterator<Item = N>,
        sums: impl IntoIterator<Item = (N, Vec<N>)>,
        prods: impl IntoIterator<Item = (N, Vec<N>)>,
    ) -> Result<Self, GraphError> {
        let nodes: FxIndexSet<N> = nodes.into_iter().collect();

        let mut singleton_ids = FxIndexSet::default();
        for singleton in singletons {
            let id = nodes
                .get_index_of(&singleton)
                .ok_or_else(|| GraphError::UnmetSingleton {
                    node: singleton.to_string(),
                })?;
            singleton_ids.insert(id);
        }
        let sum_ids = resolve_derivations(&nodes, sums)?;
        let prod_ids = resolve_derivations(&nodes, prods)?;

        let graph = Self {
            name: name.into(),
            nodes,
            singletons: singleton_ids,
            sums: sum_ids,
            prods: prod_ids,
            dists: Vec::new(),
            stoch: FxHashMap::default(),
        };
        graph.validate()?;
        tracing::debug!(
            graph = %graph.name,
            nodes = graph.node_size(),
            sums = graph.sums.len(),
            prods = graph.prods.len(),
            "causal graph built"
        );
        Ok(graph)
    }

    /// [`CausalGraph::build`], then attach `priors`. Priors naming unknown
    /// nodes are skipped.
    pub fn build_with_priors(
        name: impl Into<String>,
        nodes: impl IntoIterator<Item = N>,
        singletons: impl IntoIterator<Item = N>,
        sums: impl IntoIterator<Item = (N, Vec<N>)>,
        prods: impl IntoIterator<Item = (N, Vec<N>)>,
        priors: &PriorTable<N>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::build(name, nodes, singletons, sums, prods)?;
        graph.apply_priors(priors);
        Ok(graph)
    }

    /// Distributions are appended on first use by a known node, so
    /// table indices may compact.
    pub fn apply_priors(&mut self, priors: &PriorTable<N>) {
        let mut remap: Vec<Option<usize>> = vec![None; priors.dists.len()];
        for (node, dist) in &priors.assignments {
            let Some(node_id) = self.node_id(node) else {
                tracing::error!(graph = %self.name, node = %node, "skipping unmet stochastic node");
                continue;
            };
            let dist_id = match remap[*dist] {
                Some(id) => id,
                None => {
                    self.dists.push(priors.dists[*dist].clone());
                    let id = self.dists.len() - 1;
                    remap[*dist] = Some(id);
                    id
                }
            };
            self.stoch.insert(node_id, dist_id);
        }
    }

    pub fn node_id(&self, node: &N) -> Option<usize> {
        self.nodes.get_index_of(node)
    }

    /// Append a node; an existing name returns its id unchanged.
    pub fn add_node(&mut self, node: N) -> usize {
        self.nodes.insert_full(node).0
    }

    /// Append a fresh distribution for `node` and return its index.
    pub fn set_stoch_node(&mut self, node: &N, dist: Categorical01) -> Option<usize> {
        let Some(node_id) = self.node_id(node) else {
            tracing::error!(graph = %self.name, node = %node, "skipping unmet stochastic node");
            return None;
        };
        self.dists.push(dist);
        let dist_id = self.dists.len() - 1;
        self.stoch.insert(node_id, dist_id);
        Some(dist_id)
    }
}

impl<N> CausalGraph<N> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn node(&self, id: usize) -> Option<&N> {
        self.nodes.get_index(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.nodes.iter()
    }

    pub fn node_size(&self) -> usize {
        self.nodes.len()
    }

    pub fn dist_size(&self) -> usize {
        self.dists.len()
    }

    pub fn distributions(&self) -> &[Categorical01] {
        &self.dists
    }

    pub fn distributions_mut(&mut self) -> &mut [Categorical01] {
        &mut self.dists
    }

    pub fn dist_id_of(&self, node_id: usize) -> Option<usize> {
        self.stoch.get(&node_id).copied()
    }

    pub fn is_singleton(&self, node_id: usize) -> bool {
        self.singletons.contains(&node_id)
    }

    pub fn is_stoch_node(&self, node_id: usize) -> bool {
        self.stoch.contains_key(&node_id)
    }

    pub fn is_sum(&self, node_id: usize) -> bool {
        self.sums.contains_key(&node_id)
    }

    pub fn is_prod(&self, node_id: usize) -> bool {
        self.prods.contains_key(&node_id)
    }

    pub fn singletons(&self) -> impl Iterator<Item = usize> + '_ {
        self.singletons.iter().copied()
    }

    pub fn sums(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.sums.iter().map(|(h, b)| (*h, b.as_slice()))
    }

    pub fn prods(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.prods.iter().map(|(h, b)| (*h, b.as_slice()))
    }

    pub fn sum(&self, head: usize) -> Option<&[usize]> {
        self.sums.get(&head).map(Vec::as_slice)
    }

    pub fn prod(&self, head: usize) -> Option<&[usize]> {
        self.prods.get(&head).map(Vec::as_slice)
    }

    /// Insert or replace the disjunction deriving `head`.
    pub fn add_sum(&mut self, head: usize, body: Vec<usize>) -> Result<(), GraphError> {
        let body = self.checked_body(head, body)?;
        self.sums.insert(head, body);
        Ok(())
    }

    /// Insert or replace the conjunction deriving `head`.
    pub fn add_prod(&mut self, head: usize, body: Vec<usize>) -> Result<(), GraphError> {
        let body = self.checked_body(head, body)?;
        self.prods.insert(head, body);
        Ok(())
    }

    fn checked_body(&self, head: usize, body: Vec<usize>) -> Result<Vec<usize>, GraphError> {
        let size = self.nodes.len();
        if head >= size {
            return Err(GraphError::NodeOutOfRange { id: head, size });
        }
        let mut seen: FxIndexSet<usize> = FxIndexSet::default();
        for sub in body {
            if sub >= size {
                return Err(GraphError::NodeOutOfRange { id: sub, size });
            }
            if sub == head {
                return Err(GraphError::SelfReference {
                    head: head.to_string(),
                });
            }
            seen.insert(sub);
        }
        Ok(seen.into_iter().collect())
    }

    /// Share an existing distribution with another node.
    pub fn tie_stoch_node(&mut self, node_id: usize, dist_id: usize) -> Result<(), GraphError> {
        if node_id >= self.nodes.len() {
            return Err(GraphError::NodeOutOfRange {
                id: node_id,
                size: self.nodes.len(),
            });
        }
        if dist_id >= self.dists.len() {
            return Err(GraphError::DistOutOfRange {
                id: dist_id,
                size: self.dists.len(),
            });
        }
        self.stoch.insert(node_id, dist_id);
        Ok(())
    }

    /// Drop every distribution and every node annotation.
    pub fn reset_stoch_nodes(&mut self) {
        self.stoch.clear();
        self.dists.clear();
    }

    /// Stochastic nodes in node order, with their distribution ids.
    pub fn stoch_nodes(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = self.stoch.iter().map(|(n, d)| (*n, *d)).collect();
        pairs.sort_unstable();
        pairs
    }
}

impl<N: fmt::Display> CausalGraph<N> {
    /// Exactly one role per node. Run by `build` and again after edits.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (id, node) in self.nodes.iter().enumerate() {
            let roles = usize::from(self.singletons.contains(&id))
                + usize::from(self.sums.contains_key(&id))
                + usize::from(self.prods.contains_key(&id));
            if roles == 0 {
                return Err(GraphError::RedundantNode {
                    node: node.to_string(),
                });
            }
            if roles > 1 {
                return Err(GraphError::OverlappedNode {
                    node: node.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn resolve_derivations<N>(
    nodes: &FxIndexSet<N>,
    derivations: impl IntoIterator<Item = (N, Vec<N>)>,
) -> Result<FxIndexMap<usize, Vec<usize>>, GraphError>
where
    N: Eq + Hash + fmt::Display,
{
    let mut resolved = FxIndexMap::default();
    for (head, body) in derivations {
        let head_id = nodes
            .get_index_of(&head)
            .ok_or_else(|| GraphError::UnmetHead {
                node: head.to_string(),
            })?;
        let mut body_ids: FxIndexSet<usize> = FxIndexSet::default();
        for sub in &body {
            let sub_id = nodes
                .get_index_of(sub)
                .ok_or_else(|| GraphError::UnmetSub {
                    head: head.to_string(),
                    sub: sub.to_string(),
                })?;
            if sub_id == head_id {
                return Err(GraphError::SelfReference {
                    head: head.to_string(),
                });
            }
            body_ids.insert(sub_id);
        }
        if resolved.insert(head_id, body_ids.into_iter().collect()).is_some() {
            return Err(GraphError::OverlappedNode {
                node: head.to_string(),
            });
        }
    }
    Ok(resolved)
}
