//! Exact inference by variable elimination over dense tables.
//!
//! Intended as a reference backend for small networks and tests: every
//! query eliminates all other variables with a greedy min-scope order, so
//! beliefs are exact and `run_bp` converges in one step.

use std::path::Path;
use std::time::Instant;

use credence_core::errors::SolverError;
use credence_core::types::collections::{FxHashMap, FxIndexMap};

use super::parse::{self, ParamFactor};
use super::table::{checked_size, Table};
use super::{CompiledNetwork, Solver, SolverOptions};
use crate::factor::Factor;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExactSolver;

impl ExactSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for ExactSolver {
    fn name(&self) -> &str {
        "exact"
    }

    fn load(
        &self,
        fg_path: &Path,
        options: &SolverOptions,
    ) -> Result<Box<dyn CompiledNetwork>, SolverError> {
        let factors = parse::parse_fg(fg_path)?;
        let network = ExactNetwork::new(&factors, options.clone(), &fg_path.display().to_string())?;
        tracing::debug!(
            path = %fg_path.display(),
            factors = factors.len(),
            vars = network.cards.len(),
            "exact network loaded"
        );
        Ok(Box::new(network))
    }
}

#[derive(Debug)]
struct ExactNetwork {
    tables: Vec<Table>,
    /// Cardinality per variable; 0 marks an id no factor mentions.
    cards: Vec<usize>,
    evidence: FxIndexMap<usize, usize>,
    beliefs: FxHashMap<usize, Vec<f64>>,
    options: SolverOptions,
}

impl ExactNetwork {
    fn new(factors: &[Factor], options: SolverOptions, label: &str) -> Result<Self, SolverError> {
        let mut cards: Vec<usize> = Vec::new();
        let mut tables = Vec::with_capacity(factors.len());
        for (i, factor) in factors.iter().enumerate() {
            for (var, card) in factor.vars().iter().zip(factor.cards()) {
                if *var >= cards.len() {
                    cards.resize(var + 1, 0);
                }
                if cards[*var] != 0 && cards[*var] != *card {
                    return Err(SolverError::Parse {
                        path: label.to_string(),
                        line: 0,
                        message: format!(
                            "variable {var} has cardinality {} and {card}",
                            cards[*var]
                        ),
                    });
                }
                cards[*var] = *card;
            }
            let table = Table::from_factor(factor, options.max_table_entries).map_err(|e| match e {
                SolverError::Parse { message, .. } => SolverError::Parse {
                    path: label.to_string(),
                    line: 0,
                    message: format!("factor {i}: {message}"),
                },
                other => other,
            })?;
            tables.push(table);
        }
        Ok(Self {
            tables,
            cards,
            evidence: FxIndexMap::default(),
            beliefs: FxHashMap::default(),
            options,
        })
    }

    fn card(&self, var: usize) -> Result<usize, SolverError> {
        match self.cards.get(var) {
            Some(card) if *card > 0 => Ok(*card),
            _ => Err(SolverError::VariableOutOfRange {
                var,
                count: self.cards.len(),
            }),
        }
    }

    /// Tables left after clamping evidence and eliminating every variable but `keep`.
    fn eliminate(&self, keep: Option<usize>) -> Result<Vec<Table>, SolverError> {
        let limit = self.options.max_table_entries;
        let mut tables: Vec<Table> = self
            .tables
            .iter()
            .map(|t| {
                self.evidence
                    .iter()
                    .filter(|(var, _)| t.contains(**var))
                    .fold(t.clone(), |acc, (var, state)| acc.restrict(*var, *state))
            })
            .collect();

        let mut pending: Vec<usize> = tables
            .iter()
            .flat_map(|t| t.vars.iter().copied())
            .filter(|v| Some(*v) != keep)
            .collect();
        pending.sort_unstable();
        pending.dedup();

        while !pending.is_empty() {
            let (pos, _) = pending
                .iter()
                .enumerate()
                .map(|(pos, var)| (pos, self.scope_size(&tables, *var)))
                .min_by_key(|(pos, size)| (*size, *pos))
                .unwrap_or((0, 0));
            let var = pending.remove(pos);

            let (touching, rest): (Vec<Table>, Vec<Table>) =
                tables.into_iter().partition(|t| t.contains(var));
            let refs: Vec<&Table> = touching.iter().collect();
            let joined = Table::product(&refs, limit)?.sum_out(var);
            tables = rest;
            tables.push(joined);
        }
        Ok(tables)
    }

    fn scope_size(&self, tables: &[Table], var: usize) -> usize {
        let mut scope: Vec<usize> = tables
            .iter()
            .filter(|t| t.contains(var))
            .flat_map(|t| t.vars.iter().copied())
            .collect();
        scope.sort_unstable();
        scope.dedup();
        let cards: Vec<usize> = scope
            .iter()
            .map(|v| self.cards.get(*v).copied().unwrap_or(1))
            .collect();
        checked_size(&cards, usize::MAX).unwrap_or(usize::MAX)
    }

    fn partition(&self) -> Result<f64, SolverError> {
        let tables = self.eliminate(None)?;
        let refs: Vec<&Table> = tables.iter().collect();
        let z = Table::product(&refs, self.options.max_table_entries)?.total();
        if !(z > 0.0) {
            return Err(SolverError::InconsistentEvidence);
        }
        Ok(z)
    }

    fn belief(&self, var: usize) -> Result<Vec<f64>, SolverError> {
        let card = self.card(var)?;
        if let Some(&state) = self.evidence.get(&var) {
            self.partition()?;
            let mut belief = vec![0.0; card];
            belief[state] = 1.0;
            return Ok(belief);
        }
        let tables = self.eliminate(Some(var))?;
        let refs: Vec<&Table> = tables.iter().collect();
        let joint = Table::product(&refs, self.options.max_table_entries)?;
        let values = if joint.vars.is_empty() {
            vec![joint.values[0]; card]
        } else {
            joint.values
        };
        let total: f64 = values.iter().sum();
        if !(total > 0.0) {
            return Err(SolverError::InconsistentEvidence);
        }
        Ok(values.into_iter().map(|v| v / total).collect())
    }

    fn em_rounds(
        &mut self,
        table: &parse::EvidenceTable,
        params: &[ParamFactor],
    ) -> Result<(u32, bool), SolverError> {
        let started = Instant::now();
        let budget = self.options.time_budget();
        let mut rounds = 0;
        while rounds < self.options.em_max_iterations {
            if started.elapsed() > budget {
                tracing::warn!(rounds, "EM time budget exhausted, keeping last estimate");
                return Ok((rounds, false));
            }
            let mut acc: Vec<Vec<f64>> = params
                .iter()
                .map(|p| vec![0.0; self.tables[p.factor].values.len()])
                .collect();
            let mut used = 0usize;
            for row in &table.rows {
                self.evidence.clear();
                for (var, value) in table.vars.iter().zip(row) {
                    if let Some(value) = value {
                        self.evidence.insert(*var, usize::from(*value));
                    }
                }
                let beliefs: Result<Vec<Vec<f64>>, SolverError> =
                    params.iter().map(|p| self.belief(p.var)).collect();
                match beliefs {
                    Ok(beliefs) => {
                        used += 1;
                        for (sum, belief) in acc.iter_mut().zip(beliefs) {
                            for (s, b) in sum.iter_mut().zip(belief) {
                                *s += b;
                            }
                        }
                    }
                    Err(SolverError::InconsistentEvidence) => {
                        tracing::debug!(round = rounds, "skipping inconsistent EM row");
                    }
                    Err(e) => return Err(e),
                }
            }
            if used == 0 {
                tracing::warn!("no EM row is consistent with the network, keeping priors");
                return Ok((rounds, false));
            }

            let mut max_change = 0.0_f64;
            for (param, sum) in params.iter().zip(acc) {
                let values = &mut self.tables[param.factor].values;
                for (old, s) in values.iter_mut().zip(sum) {
                    let new = s / used as f64;
                    max_change = max_change.max((new - *old).abs());
                    *old = new;
                }
            }
            rounds += 1;
            if max_change < self.options.tolerance {
                return Ok((rounds, true));
            }
        }
        Ok((rounds, false))
    }
}

impl CompiledNetwork for ExactNetwork {
    fn num_vars(&self) -> usize {
        self.cards.len()
    }

    fn observe(&mut self, var: usize, value: bool) -> Result<(), SolverError> {
        let card = self.card(var)?;
        let state = usize::from(value);
        if state >= card {
            return Err(SolverError::InconsistentEvidence);
        }
        self.evidence.insert(var, state);
        self.beliefs.clear();
        Ok(())
    }

    fn reset(&mut self) {
        self.evidence.clear();
        self.beliefs.clear();
    }

    fn run_bp(&mut self) -> Result<(), SolverError> {
        let _span = tracing::debug_span!("credence.solve", evidence = self.evidence.len()).entered();
        let z = self.partition()?;
        tracing::debug!(partition = z, "exact inference ready");
        Ok(())
    }

    fn run_em(&mut self, tab_path: &Path, em_path: &Path) -> Result<(), SolverError> {
        let _span = tracing::info_span!("credence.solve", mode = "em").entered();
        let table = parse::parse_tab(tab_path)?;
        let params = parse::parse_em(em_path)?;
        for p in &params {
            let single = self
                .tables
                .get(p.factor)
                .is_some_and(|t| t.vars.as_slice() == [p.var]);
            if !single {
                return Err(SolverError::FactorOutOfRange {
                    factor: p.factor,
                    count: self.tables.len(),
                });
            }
        }
        for var in &table.vars {
            self.card(*var)?;
        }

        let saved = std::mem::take(&mut self.evidence);
        let result = self.em_rounds(&table, &params);
        self.evidence = saved;
        self.beliefs.clear();
        let (rounds, converged) = result?;
        tracing::info!(
            rounds,
            converged,
            rows = table.rows.len(),
            params = params.len(),
            "EM finished"
        );
        Ok(())
    }

    fn query_marginal(&mut self, var: usize) -> Result<f64, SolverError> {
        let belief = self.query_factor(var)?;
        Ok(belief.get(1).copied().unwrap_or(0.0))
    }

    fn query_factor(&mut self, var: usize) -> Result<Vec<f64>, SolverError> {
        if let Some(belief) = self.beliefs.get(&var) {
            return Ok(belief.clone());
        }
        let belief = self.belief(var)?;
        self.beliefs.insert(var, belief.clone());
        Ok(belief)
    }
}
