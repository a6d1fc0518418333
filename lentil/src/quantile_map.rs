//! Empirical quantile warping of one population onto another.
//!
//! Given reference and target values of one cluster along one factor,
//! estimate both quantile curves at `quantiles` evenly spaced
//! probabilities and map each target value to the reference value at
//! the matching quantile.

use crate::lentil_common::*;
use rand::seq::SliceRandom;
use rand::Rng;

/// A map from target values to the reference scale
#[derive(Clone, Debug, PartialEq)]
pub enum QuantileWarp {
    /// a single target cell takes the reference mean
    Constant(f32),
    /// both populations are constant zero
    Zero,
    /// piecewise linear from the target quantiles to the reference
    /// quantiles
    Interpolate(PiecewiseLinear),
}

/// Piecewise linear through `(knots[i], values[i])`, flat outside the
/// knots. Only built from quantile curves: `knots` is non-empty,
/// strictly increasing and as long as `values`.
#[derive(Clone, Debug, PartialEq)]
pub struct PiecewiseLinear {
    knots: Vec<f32>,
    values: Vec<f32>,
}

impl PiecewiseLinear {
    pub fn knots(&self) -> &[f32] {
        &self.knots
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn eval(&self, x: f32) -> f32 {
        let (knots, values) = (&self.knots, &self.values);
        if x.is_nan() {
            return f32::NAN;
        }
        let last = knots.len() - 1;
        if x <= knots[0] {
            return values[0];
        }
        if x >= knots[last] {
            return values[last];
        }
        let hi = knots.partition_point(|&k| k <= x);
        let lo = hi - 1;
        let t = (x as f64 - knots[lo] as f64) / (knots[hi] as f64 - knots[lo] as f64);
        (values[lo] as f64 + t * (values[hi] as f64 - values[lo] as f64)) as f32
    }
}

impl QuantileWarp {
    /// Estimate the warp of `target` onto `reference`.
    ///
    /// * `reference` - raw values of the reference population
    /// * `target` - raw values of the population to be warped
    /// * `quantiles` - number of probability points in `[0, 1]`
    /// * `max_sample` - at most this many values of each population
    ///   (drawn at random) are used to estimate the quantiles
    ///
    pub fn build<R: Rng + ?Sized>(
        reference: &[f32],
        target: &[f32],
        quantiles: usize,
        max_sample: usize,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        if reference.is_empty() || target.is_empty() {
            return Err(AlignError::QuantileMappingFailure {
                reason: format!(
                    "empty population (reference: {}, target: {})",
                    reference.len(),
                    target.len()
                )
                .into(),
            }
            .into());
        }
        if quantiles < 2 || max_sample == 0 {
            return Err(AlignError::QuantileMappingFailure {
                reason: format!(
                    "need quantiles >= 2 and max_sample >= 1, got {} and {}",
                    quantiles, max_sample
                )
                .into(),
            }
            .into());
        }

        if target.len() == 1 {
            return Ok(QuantileWarp::Constant(mean(reference)));
        }

        let probs = linspace_probs(quantiles);

        let target_q = quantile_curve(&subsample_sorted(target, max_sample, rng), &probs);
        let reference_q = quantile_curve(&subsample_sorted(reference, max_sample, rng), &probs);

        if is_constant_zero(&reference_q) && is_constant_zero(&target_q) {
            return Ok(QuantileWarp::Zero);
        }

        Ok(interpolate_knots(&target_q, &reference_q))
    }

    /// Map every value
    pub fn apply(&self, values: &[f32]) -> Vec<f32> {
        values.iter().map(|&x| self.eval(x)).collect()
    }

    pub fn eval(&self, x: f32) -> f32 {
        match self {
            QuantileWarp::Constant(c) => *c,
            QuantileWarp::Zero => 0.0,
            QuantileWarp::Interpolate(f) => f.eval(x),
        }
    }
}

/// Average of the values, accumulated in `f64`
pub fn mean(values: &[f32]) -> f32 {
    (values.iter().map(|&x| x as f64).sum::<f64>() / values.len() as f64) as f32
}

/// `quantiles` evenly spaced probabilities from 0 to 1 inclusive
pub fn linspace_probs(quantiles: usize) -> Vec<f64> {
    match quantiles {
        0 => vec![],
        1 => vec![0.0],
        _ => {
            let denom = (quantiles - 1) as f64;
            (0..quantiles).map(|i| i as f64 / denom).collect()
        }
    }
}

/// Quantiles of sorted values at the given probabilities, linearly
/// interpolated between order statistics (position `(n - 1) * p`)
pub fn quantile_curve(sorted: &[f32], probs: &[f64]) -> Vec<f32> {
    let nn = sorted.len();
    if nn == 0 {
        return vec![];
    }
    probs
        .iter()
        .map(|&p| {
            let pos = (nn - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = pos.floor() as usize;
            let rest = pos - lo as f64;
            if lo + 1 < nn {
                let (a, b) = (sorted[lo] as f64, sorted[lo + 1] as f64);
                (a + rest * (b - a)) as f32
            } else {
                sorted[lo]
            }
        })
        .collect()
}

/// Sorted copy of `values`, or of a random subset of `max_sample` of
/// them when there are more
fn subsample_sorted<R: Rng + ?Sized>(values: &[f32], max_sample: usize, rng: &mut R) -> Vec<f32> {
    let mut sample = values.to_vec();
    if sample.len() > max_sample {
        sample.shuffle(rng);
        sample.truncate(max_sample);
    }
    sample.sort_by(|a, b| a.total_cmp(b));
    sample
}

/// all zero, hence fewer than two distinct values
fn is_constant_zero(curve: &[f32]) -> bool {
    let sum = curve.iter().map(|&x| x as f64).sum::<f64>();
    sum == 0.0 && num_distinct_sorted(curve) < 2
}

fn num_distinct_sorted(curve: &[f32]) -> usize {
    if curve.is_empty() {
        return 0;
    }
    1 + curve.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Collapse repeated knots, averaging their values
fn interpolate_knots(knots_in: &[f32], values_in: &[f32]) -> QuantileWarp {
    debug_assert_eq!(knots_in.len(), values_in.len());

    let mut knots: Vec<f32> = Vec::with_capacity(knots_in.len());
    let mut values: Vec<f32> = Vec::with_capacity(values_in.len());

    let mut i = 0;
    while i < knots_in.len() {
        let mut j = i + 1;
        while j < knots_in.len() && knots_in[j] == knots_in[i] {
            j += 1;
        }
        knots.push(knots_in[i]);
        values.push(mean(&values_in[i..j]));
        i = j;
    }

    QuantileWarp::Interpolate(PiecewiseLinear { knots, values })
}
