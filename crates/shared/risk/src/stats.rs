//! Sample statistics helpers

use aegis_core::{Error, Result};

/// Log returns `ln(p_t) - ln(p_{t-1})` over the full series
///
/// Requires at least two prices, all finite and strictly positive.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>> {
    if prices.len() < 2 {
        return Err(Error::InsufficientData {
            needed: 2,
            got: prices.len(),
        });
    }
    if let Some(bad) = prices.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err(Error::invalid(format!("prices must be positive and finite, got {bad}")));
    }

    Ok(prices.windows(2).map(|w| w[1].ln() - w[0].ln()).collect())
}

/// Percentile with linear interpolation between closest ranks
///
/// `q` is a fraction in [0, 1]. Uses numpy's default (linear) rank
/// `q * (n - 1)`; statrs' `quantile` places ranks differently.
pub fn percentile(xs: &[f64], q: f64) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
