//! Sparse factor tables as written to and read from `.fg` files.

use smallvec::SmallVec;

/// One factor: variables, their cardinalities, and the nonzero entries.
///
/// States are indexed with the first variable as the least significant
/// digit. `V` is the variable handle; compiled graphs use `usize` ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor<V = usize> {
    vars: SmallVec<[V; 6]>,
    cards: SmallVec<[usize; 6]>,
    entries: Vec<(u64, f64)>,
}

impl<V> Factor<V> {
    pub fn new(
        vars: impl IntoIterator<Item = V>,
        cards: impl IntoIterator<Item = usize>,
        entries: Vec<(u64, f64)>,
    ) -> Self {
        Self {
            vars: vars.into_iter().collect(),
            cards: cards.into_iter().collect(),
            entries,
        }
    }

    pub fn vars(&self) -> &[V] {
        &self.vars
    }

    pub fn cards(&self) -> &[usize] {
        &self.cards
    }

    pub fn entries(&self) -> &[(u64, f64)] {
        &self.entries
    }

    /// Number of joint states, saturating on overflow.
    pub fn state_count(&self) -> usize {
        self.cards
            .iter()
            .try_fold(1usize, |acc, c| acc.checked_mul(*c))
            .unwrap_or(usize::MAX)
    }

    pub fn map_vars<W>(&self, f: impl Fn(&V) -> W) -> Factor<W> {
        Factor {
            vars: self.vars.iter().map(f).collect(),
            cards: self.cards.clone(),
            entries: self.entries.clone(),
        }
    }
}

// ============================================================================
// Encodings
// ============================================================================

/// Dense distribution over a parameter variable, one entry per state.
pub fn categorical<V>(var: V, weights: &[f64]) -> Factor<V> {
    Factor::new(
        [var],
        [weights.len()],
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| (i as u64, *w))
            .collect(),
    )
}

/// `P(x = 1 | param = j) = supports[j]` over `(x, param)`; zero weights are
/// left out.
pub fn bernoulli<V>(x: V, param: V, supports: &[f64]) -> Factor<V> {
    let mut entries = Vec::with_capacity(supports.len() * 2);
    for (j, p) in supports.iter().enumerate() {
        let false_rep = j as u64 * 2;
        let false_prob = 1.0 - p;
        if false_prob > 0.0 {
            entries.push((false_rep, false_prob));
        }
        if *p > 0.0 {
            entries.push((false_rep + 1, *p));
        }
    }
    Factor::new([x, param], [2, supports.len()], entries)
}

/// Forces a binary variable to true.
pub fn constant_true<V>(var: V) -> Factor<V> {
    Factor::new([var], [2], vec![(1, 1.0)])
}

/// Deterministic disjunction over `(head, body...)`.
pub fn or<V>(head: V, body: Vec<V>) -> Factor<V> {
    clause(head, None, body, |sub, _| sub != 0)
}

/// Deterministic conjunction over `(head, body...)`.
pub fn and<V>(head: V, body: Vec<V>) -> Factor<V> {
    clause(head, None, body, |sub, all| sub == all)
}

/// Disjunction over `(head, control, body...)`; control 0 forces the head false.
pub fn gated_or<V>(head: V, control: V, body: Vec<V>) -> Factor<V> {
    clause(head, Some(control), body, |sub, _| sub != 0)
}

/// Conjunction over `(head, control, body...)`; control 0 forces the head false.
pub fn gated_and<V>(head: V, control: V, body: Vec<V>) -> Factor<V> {
    clause(head, Some(control), body, |sub, all| sub == all)
}

fn clause<V>(
    head: V,
    control: Option<V>,
    body: Vec<V>,
    result: impl Fn(u64, u64) -> bool,
) -> Factor<V> {
    let all: u64 = (1u64 << body.len()) - 1;
    let gated = control.is_some();
    let mut entries = Vec::with_capacity(((all + 1) * if gated { 2 } else { 1 }) as usize);
    for sub in 0..=all {
        let value = u64::from(result(sub, all));
        if gated {
            let block_rep = sub * 4;
            entries.push((block_rep, 1.0));
            entries.push((block_rep + 2 + value, 1.0));
        } else {
            entries.push((sub * 2 + value, 1.0));
        }
    }
    let mut vars: SmallVec<[V; 6]> = SmallVec::with_capacity(body.len() + 2);
    vars.push(head);
    vars.extend(control);
    vars.extend(body);
    let cards = vec![2; vars.len()];
    Factor {
        vars,
        cards: cards.into_iter().collect(),
        entries,
    }
}
