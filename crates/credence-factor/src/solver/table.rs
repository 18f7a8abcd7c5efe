//! Dense factor tables for the exact backend.

use credence_core::errors::SolverError;
use smallvec::SmallVec;

use crate::factor::Factor;

type Scope = SmallVec<[usize; 8]>;

/// Dense potential over `vars`; the first variable is the least significant digit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub(crate) vars: Scope,
    pub(crate) cards: Scope,
    pub(crate) values: Vec<f64>,
}

impl Table {
    pub(crate) fn scalar(value: f64) -> Self {
        Self {
            vars: Scope::new(),
            cards: Scope::new(),
            values: vec![value],
        }
    }

    pub(crate) fn from_factor(factor: &Factor, limit: usize) -> Result<Self, SolverError> {
        let size = checked_size(factor.cards(), limit)?;
        let mut values = vec![0.0; size];
        for (state, weight) in factor.entries() {
            let slot = values
                .get_mut(*state as usize)
                .ok_or_else(|| SolverError::Parse {
                    path: String::new(),
                    line: 0,
                    message: format!("state {state} exceeds table size {size}"),
                })?;
            *slot = *weight;
        }
        Ok(Self {
            vars: factor.vars().iter().copied().collect(),
            cards: factor.cards().iter().copied().collect(),
            values,
        })
    }

    pub(crate) fn contains(&self, var: usize) -> bool {
        self.vars.contains(&var)
    }

    pub(crate) fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Fix `var` to `state` and drop it from the scope.
    pub(crate) fn restrict(&self, var: usize, state: usize) -> Self {
        let Some(pos) = self.vars.iter().position(|v| *v == var) else {
            return self.clone();
        };
        let stride: usize = self.cards[..pos].iter().product();
        let card = self.cards[pos];
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);
        let size = self.values.len() / card;
        let mut values = Vec::with_capacity(size);
        for idx in 0..size {
            let low = idx % stride;
            let high = idx / stride;
            values.push(self.values[low + stride * (state + card * high)]);
        }
        Self { vars, cards, values }
    }

    /// Marginalise `var` out.
    pub(crate) fn sum_out(&self, var: usize) -> Self {
        let Some(pos) = self.vars.iter().position(|v| *v == var) else {
            return self.clone();
        };
        let card = self.cards[pos];
        let mut out = self.restrict(var, 0);
        for state in 1..card {
            let slice = self.restrict(var, state);
            for (acc, v) in out.values.iter_mut().zip(&slice.values) {
                *acc += v;
            }
        }
        out
    }

    /// Pointwise product over the union of scopes.
    pub(crate) fn product(tables: &[&Table], limit: usize) -> Result<Self, SolverError> {
        let mut vars = Scope::new();
        let mut cards = Scope::new();
        for table in tables {
            for (v, c) in table.vars.iter().zip(&table.cards) {
                if !vars.contains(v) {
                    vars.push(*v);
                    cards.push(*c);
                }
            }
        }
        let size = checked_size(&cards, limit)?;

        // Per table, the stride of each union variable (0 when absent).
        let strides: Vec<Scope> = tables
            .iter()
            .map(|table| {
                let mut own = Scope::new();
                let mut acc = 1;
                for c in &table.cards {
                    own.push(acc);
                    acc *= c;
                }
                vars.iter()
                    .map(|v| {
                        table
                            .vars
                            .iter()
                            .position(|tv| tv == v)
                            .map_or(0, |p| own[p])
                    })
                    .collect()
            })
            .collect();

        let mut digits: Scope = SmallVec::from_elem(0, vars.len());
        let mut index: Vec<usize> = vec![0; tables.len()];
        let mut values = Vec::with_capacity(size);
        for _ in 0..size {
            let value: f64 = tables
                .iter()
                .zip(&index)
                .map(|(t, i)| t.values[*i])
                .product();
            values.push(value);
            // odometer step, keeping every table index in sync
            for k in 0..vars.len() {
                digits[k] += 1;
                for (i, s) in index.iter_mut().zip(&strides) {
                    *i += s[k];
                }
                if digits[k] < cards[k] {
                    break;
                }
                for (i, s) in index.iter_mut().zip(&strides) {
                    *i -= s[k] * cards[k];
                }
                digits[k] = 0;
            }
        }
        Ok(Self { vars, cards, values })
    }
}

pub(crate) fn checked_size(cards: &[usize], limit: usize) -> Result<usize, SolverError> {
    let size = cards
        .iter()
        .try_fold(1usize, |acc, c| acc.checked_mul(*c))
        .unwrap_or(usize::MAX);
    if size > limit {
        return Err(SolverError::TableTooLarge {
            entries: size,
            limit,
        });
    }
    Ok(size)
}
