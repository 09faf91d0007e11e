//! Strategy summary statistics over a computed payoff curve.
//! All functions are pure -- they take curves and return computed values.

use crate::state::{OptionLeg, PayoffCurve};

#[derive(Debug, Clone, serde::Serialize)]
pub struct StrategySummary {
    /// Positive = net debit paid, negative = net credit received.
    pub net_premium: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub breakevens: Vec<f64>,
}

/// Sum of premiums paid minus premiums received.
pub fn net_premium(legs: &[OptionLeg]) -> f64 {
    legs.iter().map(|l| l.signed_quantity() * l.premium).sum()
}

/// Prices where the curve crosses or touches zero, ascending. Sign changes
/// between samples are linearly interpolated.
pub fn breakevens(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let mut out = Vec::new();
    let n = xs.len().min(ys.len());

    for i in 0..n {
        if ys[i] == 0.0 {
            // Skip flat zero runs: only report the edges
            let prev_zero = i > 0 && ys[i - 1] == 0.0;
            let next_zero = i + 1 < n && ys[i + 1] == 0.0;
            if !(prev_zero && next_zero) {
                out.push(xs[i]);
            }
            continue;
        }
        if i + 1 < n && ys[i + 1] != 0.0 && ys[i].signum() != ys[i + 1].signum() {
            let x = xs[i] + (xs[i + 1] - xs[i]) * (-ys[i] / (ys[i + 1] - ys[i]));
            out.push(x);
        }
    }

    // An all-zero curve has no meaningful breakeven
    if n > 0 && ys[..n].iter().all(|&y| y == 0.0) {
        out.clear();
    }
    out
}

pub fn summarize(legs: &[OptionLeg], curve: &PayoffCurve) -> StrategySummary {
    let ys = &curve.aggregate;
    let max_profit = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max_loss = ys.iter().copied().fold(f64::INFINITY, f64::min);

    StrategySummary {
        net_premium: net_premium(legs),
        max_profit: if ys.is_empty() { 0.0 } else { max_profit },
        max_loss: if ys.is_empty() { 0.0 } else { max_loss },
        breakevens: breakevens(curve.grid.points(), ys),
    }
}
