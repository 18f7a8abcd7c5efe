//! Birth-date (DOB) cycle breaking.
//!
//! Every tuple gets the length of its shortest derivation from the inputs.
//! A clause whose head is born strictly after all of its antecedents is
//! *forward*; the forward clauses form an acyclic subset. Augmentation then
//! re-admits non-forward clauses in bisected batches whenever a batch cannot
//! close a cycle with what has already been accepted.

use std::collections::VecDeque;

use credence_core::errors::ProvenanceError;
use credence_core::types::collections::{FxHashSet, FxIndexSet};
use credence_core::types::{ConstraintItem, Tuple};
use smallvec::SmallVec;

/// Dense-index DOB solver over one clause list.
///
/// Clause indices are positions in the slice passed to [`DobSolver::new`];
/// every returned clause list is sorted by that index.
#[derive(Debug, Clone)]
pub struct DobSolver {
    tuples: FxIndexSet<Tuple>,
    heads: Vec<usize>,
    /// Distinct body tuples per clause, first-occurrence order.
    bodies: Vec<SmallVec<[usize; 4]>>,
    /// tuple -> clauses deriving it.
    antecedents: Vec<Vec<usize>>,
    /// tuple -> clauses using it in their body.
    consequents: Vec<Vec<usize>>,
    dob: Vec<usize>,
    max_dob: usize,
    forward: Vec<bool>,
    augmented: Option<Vec<bool>>,
}

impl DobSolver {
    /// Index the clauses, run the DOB fixpoint, and classify forward clauses.
    pub fn new<'a>(
        clauses: &[ConstraintItem],
        inputs: impl IntoIterator<Item = &'a Tuple>,
    ) -> Self {
        let mut tuples = FxIndexSet::default();
        let mut heads = Vec::with_capacity(clauses.len());
        let mut bodies = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let (head, _) = tuples.insert_full(clause.head().clone());
            heads.push(head);
            let mut body: SmallVec<[usize; 4]> = SmallVec::new();
            for sub in clause.body_tuples() {
                let (idx, _) = tuples.insert_full(sub.clone());
                if !body.contains(&idx) {
                    body.push(idx);
                }
            }
            bodies.push(body);
        }

        let mut antecedents = vec![Vec::new(); tuples.len()];
        let mut consequents = vec![Vec::new(); tuples.len()];
        for (c, body) in bodies.iter().enumerate() {
            antecedents[heads[c]].push(c);
            for &b in body {
                consequents[b].push(c);
            }
        }

        let max_dob = tuples.len();
        let mut dob = vec![max_dob; tuples.len()];
        for input in inputs {
            if let Some(idx) = tuples.get_index_of(input) {
                dob[idx] = 0;
            }
        }

        let mut solver = Self {
            tuples,
            heads,
            bodies,
            antecedents,
            consequents,
            dob,
            max_dob,
            forward: Vec::new(),
            augmented: None,
        };
        solver.compute_dob();
        solver.forward = (0..solver.heads.len())
            .map(|c| solver.dob[solver.heads[c]] > solver.max_antecedent_dob(c))
            .collect();
        tracing::debug!(
            tuples = solver.tuples.len(),
            clauses = solver.heads.len(),
            forward = solver.forward.iter().filter(|f| **f).count(),
            "DOB fixpoint reached"
        );
        solver
    }

    fn compute_dob(&mut self) {
        let mut pending: Vec<usize> = self.bodies.iter().map(|b| b.len()).collect();
        let mut reached = vec![false; self.tuples.len()];
        let mut queue: VecDeque<usize> = (0..self.dob.len()).filter(|&t| self.dob[t] == 0).collect();

        for c in 0..self.heads.len() {
            if pending[c] == 0 {
                self.relax(c, &mut queue);
            }
        }

        while let Some(t) = queue.pop_front() {
            let first_visit = !reached[t];
            reached[t] = true;
            for i in 0..self.consequents[t].len() {
                let c = self.consequents[t][i];
                if first_visit {
                    pending[c] -= 1;
                }
                if pending[c] == 0 {
                    self.relax(c, &mut queue);
                }
            }
        }
    }

    /// Lower the head of a fully reached clause if it yields an earlier birth.
    fn relax(&mut self, clause: usize, queue: &mut VecDeque<usize>) {
        let candidate = (self.max_antecedent_dob(clause) + 1).min(self.max_dob);
        let head = self.heads[clause];
        if candidate < self.dob[head] {
            self.dob[head] = candidate;
            queue.push_back(head);
        }
    }

    fn max_antecedent_dob(&self, clause: usize) -> usize {
        self.bodies[clause]
            .iter()
            .map(|&b| self.dob[b])
            .max()
            .unwrap_or(0)
    }

    /// Number of distinct tuples; the DOB of anything unreachable.
    pub fn max_dob(&self) -> usize {
        self.max_dob
    }

    pub fn dob(&self, tuple: &Tuple) -> Result<usize, ProvenanceError> {
        self.tuples
            .get_index_of(tuple)
            .map(|idx| self.dob[idx])
            .ok_or_else(|| ProvenanceError::UnknownTuple {
                tuple: tuple.to_string(),
            })
    }

    pub fn num_clauses(&self) -> usize {
        self.heads.len()
    }

    pub fn forward_clauses(&self) -> Vec<usize> {
        members(&self.forward)
    }

    /// Clauses accepted by augmentation, forward clauses included.
    /// Empty until [`DobSolver::augment`] has run.
    pub fn augmented_clauses(&self) -> Vec<usize> {
        self.augmented.as_deref().map(members).unwrap_or_default()
    }

    /// The clause set coreachability walks: augmented if computed, else forward.
    pub fn chosen_clauses(&self) -> Vec<usize> {
        members(self.chosen())
    }

    fn chosen(&self) -> &[bool] {
        self.augmented.as_deref().unwrap_or(&self.forward)
    }

    /// Re-admit non-forward clauses that cannot close a cycle.
    /// Returns the newly admitted clauses. Idempotent.
    pub fn augment(&mut self) -> Vec<usize> {
        if let Some(aug) = &self.augmented {
            return (0..aug.len()).filter(|&c| aug[c] && !self.forward[c]).collect();
        }
        let mut aug = self.forward.clone();
        let candidates: Vec<usize> = (0..self.heads.len()).filter(|&c| !aug[c]).collect();
        tracing::debug!(candidates = candidates.len(), "augmenting forward clauses");
        self.augment_from_candidates(&mut aug, &candidates);
        let added: Vec<usize> = candidates.into_iter().filter(|&c| aug[c]).collect();
        tracing::debug!(added = added.len(), "forward clauses augmented");
        self.augmented = Some(aug);
        added
    }

    fn augment_from_candidates(&self, aug: &mut [bool], batch: &[usize]) {
        match batch.len() {
            0 => tracing::warn!("no candidates to augment forward clauses"),
            _ if self.disjoint_against(aug, batch) => {
                for &c in batch {
                    aug[c] = true;
                }
            }
            1 => tracing::debug!(clause = batch[0], "backward clause rejected"),
            len => {
                let (left, right) = batch.split_at(len / 2);
                self.augment_from_candidates(aug, left);
                self.augment_from_candidates(aug, right);
            }
        }
    }

    /// Whether accepting `batch` on top of the current chosen set keeps it acyclic.
    pub fn is_ancestor_descendant_disjoint(&self, batch: &[usize]) -> bool {
        self.disjoint_against(self.chosen(), batch)
    }

    fn disjoint_against(&self, accepted: &[bool], batch: &[usize]) -> bool {
        let mut ancestors = FxHashSet::default();
        let mut descendants = FxHashSet::default();
        let mut new_ancestors = VecDeque::new();
        let mut new_descendants = VecDeque::new();
        for &c in batch {
            for &b in &self.bodies[c] {
                if ancestors.insert(b) {
                    new_ancestors.push_back(b);
                }
            }
            if descendants.insert(self.heads[c]) {
                new_descendants.push_back(self.heads[c]);
            }
        }
        // A batch clause feeding another batch clause directly.
        if ancestors.iter().any(|a| descendants.contains(a)) {
            return false;
        }

        while !new_ancestors.is_empty() || !new_descendants.is_empty() {
            let grow_ancestors = new_descendants.is_empty()
                || (!new_ancestors.is_empty() && ancestors.len() < descendants.len());
            if grow_ancestors {
                let Some(t) = new_ancestors.pop_front() else {
                    break;
                };
                for &c in &self.antecedents[t] {
                    if !accepted[c] {
                        continue;
                    }
                    for &sub in &self.bodies[c] {
                        if descendants.contains(&sub) {
                            return false;
                        }
                        if ancestors.insert(sub) {
                            new_ancestors.push_back(sub);
                        }
                    }
                }
            } else {
                let Some(t) = new_descendants.pop_front() else {
                    break;
                };
                for &c in &self.consequents[t] {
                    if !accepted[c] {
                        continue;
                    }
                    let head = self.heads[c];
                    if ancestors.contains(&head) {
                        return false;
                    }
                    if descendants.insert(head) {
                        new_descendants.push_back(head);
                    }
                }
            }
        }
        true
    }

    /// Tuples reachable backward from `observe` through the chosen clauses.
    /// Observed tuples outside the clause universe are kept as-is.
    pub fn coreachable(&self, observe: &[Tuple]) -> Vec<Tuple> {
        let reached = self.coreachable_indices(observe);
        let mut out: Vec<Tuple> = observe
            .iter()
            .filter(|t| !self.tuples.contains(*t))
            .cloned()
            .collect();
        out.extend(
            (0..self.tuples.len())
                .filter(|&t| reached[t])
                .filter_map(|t| self.tuples.get_index(t).cloned()),
        );
        out
    }

    fn coreachable_indices(&self, observe: &[Tuple]) -> Vec<bool> {
        let chosen = self.chosen();
        let mut reached = vec![false; self.tuples.len()];
        let mut worklist = VecDeque::new();
        for t in observe {
            if let Some(idx) = self.tuples.get_index_of(t) {
                if !reached[idx] {
                    reached[idx] = true;
                    worklist.push_back(idx);
                }
            }
        }
        while let Some(t) = worklist.pop_front() {
            for &c in &self.antecedents[t] {
                if !chosen[c] {
                    continue;
                }
                for &sub in &self.bodies[c] {
                    if !reached[sub] {
                        reached[sub] = true;
                        worklist.push_back(sub);
                    }
                }
            }
        }
        reached
    }

    /// Chosen clauses whose head is coreachable from `observe`.
    pub fn active_clauses(&self, observe: &[Tuple]) -> Vec<usize> {
        let reached = self.coreachable_indices(observe);
        let chosen = self.chosen();
        let active: Vec<usize> = (0..self.heads.len())
            .filter(|&c| chosen[c] && reached[self.heads[c]])
            .collect();
        tracing::debug!(
            observed = observe.len(),
            active = active.len(),
            "active clauses computed"
        );
        active
    }
}

fn members(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.then_some(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(rel: &str, i: u32) -> Tuple {
        Tuple::new(rel, [i])
    }

    fn cls(rule: u32, head: Tuple, body: Vec<Tuple>) -> ConstraintItem {
        ConstraintItem::positive(rule, head, body)
    }

    #[test]
    fn test_dob_shortest_chain() {
        let clauses = vec![
            cls(0, t("H", 0), vec![t("I", 0)]),
            cls(1, t("O", 0), vec![t("H", 0)]),
            cls(2, t("O", 0), vec![t("I", 0)]),
        ];
        let solver = DobSolver::new(&clauses, [&t("I", 0)]);
        assert_eq!(solver.max_dob(), 3);
        assert_eq!(solver.dob(&t("I", 0)).unwrap(), 0);
        assert_eq!(solver.dob(&t("H", 0)).unwrap(), 1);
        assert_eq!(solver.dob(&t("O", 0)).unwrap(), 1);
        assert_eq!(solver.forward_clauses(), vec![0, 2]);
    }

    #[test]
    fn test_unreachable_stays_at_max() {
        let clauses = vec![
            cls(0, t("A", 0), vec![t("B", 0)]),
            cls(1, t("B", 0), vec![t("A", 0)]),
        ];
        let solver = DobSolver::new(&clauses, std::iter::empty());
        assert_eq!(solver.dob(&t("A", 0)).unwrap(), 2);
        assert_eq!(solver.dob(&t("B", 0)).unwrap(), 2);
        assert!(solver.forward_clauses().is_empty());
    }

    #[test]
    fn test_unknown_tuple_is_error() {
        let solver = DobSolver::new(&[], std::iter::empty());
        let err = solver.dob(&t("X", 9)).unwrap_err();
        assert!(matches!(err, ProvenanceError::UnknownTuple { .. }));
    }

    #[test]
    fn test_batch_with_internal_cycle_rejected() {
        // Neither clause is forward; together they form a cycle.
        let clauses = vec![
            cls(0, t("A", 0), vec![t("B", 0)]),
            cls(1, t("B", 0), vec![t("A", 0)]),
        ];
        let solver = DobSolver::new(&clauses, std::iter::empty());
        assert!(!solver.is_ancestor_descendant_disjoint(&[0, 1]));
        assert!(solver.is_ancestor_descendant_disjoint(&[0]));
    }

    #[test]
    fn test_augment_keeps_one_edge_of_two_cycle() {
        let clauses = vec![
            cls(0, t("A", 0), vec![t("B", 0)]),
            cls(1, t("B", 0), vec![t("A", 0)]),
        ];
        let mut solver = DobSolver::new(&clauses, std::iter::empty());
        let added = solver.augment();
        assert_eq!(added, vec![0]);
        assert_eq!(solver.augmented_clauses(), vec![0]);
        assert_eq!(solver.augment(), vec![0]);
    }
}
