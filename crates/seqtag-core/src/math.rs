//! # Numeric Helpers
//!
//! Log-sum-exp for CRF-style normalizers and F1 scoring.

use candle_core::{D, Tensor};
use serde::Serialize;

use crate::error::Result;

/// `log(sum(exp(x)))` along the last dimension.
///
/// Uses the max-subtraction trick, `m + log(sum(exp(x - m)))`, so the result
/// stays finite for any finite input. The last dimension is removed from the
/// output shape.
pub fn log_sum_exp(x: &Tensor) -> Result<Tensor> {
    let m = x.max_keepdim(D::Minus1)?;
    let sum = x.broadcast_sub(&m)?.exp()?.sum_keepdim(D::Minus1)?;
    Ok(m.add(&sum.log()?)?.squeeze(D::Minus1)?)
}

/// Log-sum-exp over a plain slice. Returns `-inf` for an empty slice.
pub fn log_sum_exp_slice(x: &[f32]) -> f32 {
    let m = x.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if m == f32::NEG_INFINITY {
        return m;
    }
    m + x.iter().map(|&v| (v - m).exp()).sum::<f32>().ln()
}

/// Harmonic mean of precision and recall; 0 when both are 0.
pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall != 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// Running counts for precision / recall / F1 evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scores {
    /// Predictions that match a gold item
    pub correct: usize,
    /// Total predictions
    pub predicted: usize,
    /// Total gold items
    pub gold: usize,
}

impl Scores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one example's counts.
    pub fn add(&mut self, correct: usize, predicted: usize, gold: usize) {
        self.correct += correct;
        self.predicted += predicted;
        self.gold += gold;
    }

    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.gold)
    }

    pub fn f1(&self) -> f64 {
        f1(self.precision(), self.recall())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
