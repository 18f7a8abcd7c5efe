//! Cycle detection over the derivation edges of a causal graph.
//! Pruned provenance always yields a DAG; unpruned provenance may not.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use super::CausalGraph;

impl<N> CausalGraph<N> {
    /// Body -> head edges of every sum and product, on petgraph node indices
    /// that coincide with the causal node ids.
    fn derivation_digraph(&self) -> DiGraph<(), ()> {
        let mut graph = DiGraph::with_capacity(self.node_size(), 0);
        for _ in 0..self.node_size() {
            graph.add_node(());
        }
        for (head, body) in self.sums().chain(self.prods()) {
            for &sub in body {
                graph.add_edge(NodeIndex::new(sub), NodeIndex::new(head), ());
            }
        }
        graph
    }

    /// Strongly connected components with more than one node.
    pub fn find_cycles(&self) -> Vec<Vec<usize>> {
        tarjan_scc(&self.derivation_digraph())
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut ids: Vec<usize> = scc.into_iter().map(NodeIndex::index).collect();
                ids.sort_unstable();
                ids
            })
            .collect()
    }

    /// Node ids ordered so that every body precedes its head, or `None` on a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        toposort(&self.derivation_digraph(), None)
            .ok()
            .map(|order| order.into_iter().map(NodeIndex::index).collect())
    }
}
