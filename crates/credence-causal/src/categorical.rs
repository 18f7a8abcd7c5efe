//! Finite distributions over `[0,1]`, used as clause and input priors.

use std::fmt;

use credence_core::constants;
use credence_core::errors::DistributionError;
use serde::{Deserialize, Serialize};

/// Smallest probability a derived prior is allowed to reach.
pub const EPSILON: f64 = constants::PROB_EPSILON;
/// Bucket count for combined supports.
pub const NUM_SLOTS: usize = constants::PROB_NUM_SLOTS;
const STRIDE: f64 = 1.0 / NUM_SLOTS as f64;

/// A PMF over a sorted, deduplicated support in `[0,1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorical01 {
    supports: Vec<f64>,
    /// Normalised; same length as `supports`.
    weights: Vec<f64>,
}

impl Categorical01 {
    /// Mass proportional to how often each value occurs.
    pub fn new(values: &[f64]) -> Result<Self, DistributionError> {
        let weights = vec![1.0; values.len()];
        Self::with_weights(values, &weights)
    }

    pub fn with_weights(values: &[f64], weights: &[f64]) -> Result<Self, DistributionError> {
        if values.len() != weights.len() {
            return Err(DistributionError::WeightCount {
                expected: values.len(),
                actual: weights.len(),
            });
        }
        if values.is_empty() {
            return Err(DistributionError::EmptySupport);
        }
        if let Some(&value) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(DistributionError::SupportOutOfRange { value });
        }

        let mut pairs: Vec<(f64, f64)> =
            values.iter().copied().zip(weights.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut supports: Vec<f64> = Vec::with_capacity(pairs.len());
        let mut merged: Vec<f64> = Vec::with_capacity(pairs.len());
        for (v, w) in pairs {
            if supports.last() == Some(&v) {
                if let Some(last) = merged.last_mut() {
                    *last += w;
                }
            } else {
                supports.push(v);
                merged.push(w);
            }
        }
        let weights = normalise(&merged)?;
        Ok(Self { supports, weights })
    }

    /// Point mass at `p`.
    pub fn bernoulli(p: f64) -> Result<Self, DistributionError> {
        Self::new(&[p])
    }

    pub fn supports(&self) -> &[f64] {
        &self.supports
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.weights
    }

    /// Mass assigned to `x`; zero outside the support.
    pub fn probability(&self, x: f64) -> f64 {
        self.supports
            .iter()
            .position(|s| *s == x)
            .map_or(0.0, |i| self.weights[i])
    }

    /// The mean `sum(s_i * p_i)`.
    pub fn estimation(&self) -> f64 {
        self.supports
            .iter()
            .zip(&self.weights)
            .map(|(s, p)| s * p)
            .sum()
    }

    /// Re-parameterise in place, keeping the support.
    pub fn update_probs(&mut self, weights: &[f64]) -> Result<(), DistributionError> {
        if weights.len() != self.supports.len() {
            return Err(DistributionError::WeightCount {
                expected: self.supports.len(),
                actual: weights.len(),
            });
        }
        self.weights = normalise(weights)?;
        Ok(())
    }

    /// Noisy-or combination: support `1-(1-p)(1-q)`, weight `wp*wq`.
    pub fn rev_multiply(prev: Option<&Self>, post: Option<&Self>) -> Option<Self> {
        combine(prev, post, |p, q| 1.0 - (1.0 - p) * (1.0 - q))
    }

    /// Conjunction combination: support `p*q`, weight `wp*wq`.
    pub fn multiply_dist(prev: Option<&Self>, post: Option<&Self>) -> Option<Self> {
        combine(prev, post, |p, q| p * q)
    }
}

fn normalise(weights: &[f64]) -> Result<Vec<f64>, DistributionError> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
        return Err(DistributionError::ZeroMass);
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

fn combine(
    prev: Option<&Categorical01>,
    post: Option<&Categorical01>,
    op: impl Fn(f64, f64) -> f64,
) -> Option<Categorical01> {
    let (prev, post) = match (prev, post) {
        (None, other) | (other, None) => return other.cloned(),
        (Some(a), Some(b)) => (a, b),
    };
    let mut prob_slots = [0.0_f64; NUM_SLOTS + 1];
    let mut weight_slots = [0.0_f64; NUM_SLOTS + 1];
    for (&p, &wp) in prev.supports.iter().zip(&prev.weights) {
        for (&q, &wq) in post.supports.iter().zip(&post.weights) {
            let mut pq = op(p, q);
            if !(0.0..=1.0).contains(&pq) {
                tracing::error!(p, q, combined = pq, "combined support out of range, clamping");
                pq = pq.clamp(0.0, 1.0);
            }
            let w = wp * wq;
            let slot = ((pq / STRIDE).ceil() as usize).min(NUM_SLOTS);
            prob_slots[slot] += pq * w;
            weight_slots[slot] += w;
        }
    }

    let mut supports = Vec::new();
    let mut weights = Vec::new();
    for (prob, weight) in prob_slots.iter().zip(&weight_slots) {
        if *weight != 0.0 {
            supports.push((prob / weight).clamp(0.0, 1.0));
            weights.push(*weight);
        }
    }
    // Slot means are strictly increasing, so the support is already sorted.
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    Some(Categorical01 {
        supports,
        weights: weights.iter().map(|w| w / total).collect(),
    })
}

/// Java-style double rendering: integral values keep one decimal.
pub(crate) fn fmt_support(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Categorical01 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cat[")?;
        for (i, (s, w)) in self.supports.iter().zip(&self.weights).enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}:{w:.2}", fmt_support(*s))?;
        }
        f.write_str("]")
    }
}
