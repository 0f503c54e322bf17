//! Risk Calculator
//!
//! Net delta and hedge trigger, parametric VaR, max drawdown, correlation
//! and beta. All functions are pure.

use aegis_core::{Asset, Error, Result, RiskSnapshot, Timestamp};
use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::stats::{log_returns, percentile};

/// Below this return volatility a series is treated as constant
pub const MIN_SIGMA: f64 = 1e-8;

/// How spot and perpetual sizes combine into net delta
///
/// The additive form treats the perpetual size as signed exposure. The
/// alternative subtracts the perpetual's absolute size, i.e. assumes every
/// perpetual position is a short hedge against the spot holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetDeltaMode {
    /// `spot + perp`
    #[default]
    Additive,
    /// `spot - |perp|`
    SpotMinusAbsPerp,
}

/// Signed sum of spot and perpetual exposure
pub fn net_delta(spot_size: f64, perp_size: f64) -> f64 {
    spot_size + perp_size
}

pub fn net_delta_with(mode: NetDeltaMode, spot_size: f64, perp_size: f64) -> f64 {
    match mode {
        NetDeltaMode::Additive => net_delta(spot_size, perp_size),
        NetDeltaMode::SpotMinusAbsPerp => spot_size - perp_size.abs(),
    }
}

/// Maximum tolerated net delta: `|spot| * percent / 100`
pub fn threshold_limit(spot_size: f64, threshold_percent: f64) -> Result<f64> {
    if threshold_percent.is_nan() || threshold_percent < 0.0 {
        return Err(Error::invalid(format!(
            "threshold_percent must be >= 0, got {threshold_percent}"
        )));
    }
    Ok(spot_size.abs() * (threshold_percent / 100.0))
}

/// Strictly greater than: a net delta exactly at the limit does not trigger
pub fn needs_hedge(net_delta: f64, threshold_limit: f64) -> bool {
    net_delta.abs() > threshold_limit
}

/// Signed quantity of the neutralising instrument
///
/// Identity on net delta; the caller negates per instrument convention
/// (a perpetual hedge trades `-hedge_amount`).
pub fn hedge_amount(net_delta: f64) -> f64 {
    net_delta
}

/// Build a risk snapshot for one asset
pub fn evaluate(
    asset: impl Into<Asset>,
    spot_size: f64,
    perp_size: f64,
    threshold_percent: f64,
    mode: NetDeltaMode,
    timestamp: Timestamp,
) -> Result<RiskSnapshot> {
    let net = net_delta_with(mode, spot_size, perp_size);
    let limit = threshold_limit(spot_size, threshold_percent)?;

    Ok(RiskSnapshot {
        asset: asset.into(),
        net_delta: net,
        threshold_limit: limit,
        needs_hedge: needs_hedge(net, limit),
        timestamp,
    })
}

/// Value at Risk of a position over one observation interval
///
/// Parametric (normal) estimate from log returns: `-(mu + sigma * z)` with
/// `z = inverse_cdf(1 - confidence)`, floored at zero and scaled by
/// `|position_size|`. When sigma is degenerate (constant series, or a
/// single return) the empirical `(1 - confidence)` percentile of returns is
/// used instead, floored the same way.
pub fn value_at_risk(prices: &[f64], confidence: f64, position_size: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::invalid(format!(
            "confidence must be in (0, 1), got {confidence}"
        )));
    }

    let returns = log_returns(prices)?;
    let alpha = 1.0 - confidence;
    let mu = returns.iter().mean();
    let sigma = returns.iter().std_dev();
    let exposure = position_size.abs();

    if !(sigma >= MIN_SIGMA) {
        let quantile = percentile(&returns, alpha).unwrap_or(0.0);
        debug!("VaR: degenerate volatility ({sigma:e}), using empirical percentile");
        return Ok((-quantile * exposure).max(0.0));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::invalid(e.to_string()))?;
    let z = normal.inverse_cdf(alpha);
    let var_pct = -(mu + sigma * z);

    Ok((var_pct * exposure).max(0.0))
}

/// Largest peak-to-trough decline of a P&L series, always >= 0
pub fn max_drawdown(pnl_series: &[f64]) -> Result<f64> {
    if pnl_series.is_empty() {
        return Err(Error::InsufficientData { needed: 1, got: 0 });
    }

    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &pnl in pnl_series {
        peak = peak.max(pnl);
        max_dd = max_dd.max(peak - pnl);
    }
    Ok(max_dd)
}

/// Symmetric Pearson correlation matrix of log returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    assets: Vec<Asset>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Asset order of rows and columns
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Coefficient between two assets by name
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|x| x == a)?;
        let j = self.assets.iter().position(|x| x == b)?;
        Some(self.values[i][j])
    }
}

/// Correlation of log returns across assets
///
/// Series must be temporally aligned (equal length). The diagonal is 1.0 by
/// construction; off-diagonal entries are mirrored so the matrix is exactly
/// symmetric.
pub fn correlation_matrix(price_series_by_asset: &BTreeMap<Asset, Vec<f64>>) -> Result<CorrelationMatrix> {
    if price_series_by_asset.is_empty() {
        return Err(Error::InsufficientData { needed: 1, got: 0 });
    }

    let expected_len = price_series_by_asset
        .values()
        .next()
        .map(Vec::len)
        .unwrap_or_default();
    if let Some((asset, series)) = price_series_by_asset
        .iter()
        .find(|(_, s)| s.len() != expected_len)
    {
        return Err(Error::MisalignedSeries(format!(
            "{asset} has {} prices, expected {expected_len}",
            series.len()
        )));
    }

    let assets: Vec<Asset> = price_series_by_asset.keys().cloned().collect();
    let returns = price_series_by_asset
        .values()
        .map(|prices| log_returns(prices))
        .collect::<Result<Vec<_>>>()?;
    let sigmas: Vec<f64> = returns.iter().map(|r| r.iter().std_dev()).collect();

    let n = assets.len();
    if n > 1 {
        if let Some(i) = sigmas.iter().position(|s| !(*s >= MIN_SIGMA)) {
            return Err(Error::DegenerateVariance(format!(
                "{} has constant returns; correlation undefined",
                assets[i]
            )));
        }
    }

    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let cov = returns[i].iter().covariance(returns[j].iter());
            let rho = (cov / (sigmas[i] * sigmas[j])).clamp(-1.0, 1.0);
            values[i][j] = rho;
            values[j][i] = rho;
        }
    }

    Ok(CorrelationMatrix { assets, values })
}

/// `Cov(asset, benchmark) / Var(benchmark)` over log returns
pub fn beta(benchmark_prices: &[f64], asset_prices: &[f64]) -> Result<f64> {
    if benchmark_prices.len() != asset_prices.len() {
        return Err(Error::MisalignedSeries(format!(
            "benchmark has {} prices, asset has {}",
            benchmark_prices.len(),
            asset_prices.len()
        )));
    }

    let r_b = log_returns(benchmark_prices)?;
    let r_a = log_returns(asset_prices)?;
    let var_b = r_b.iter().variance();
    if !(var_b >= MIN_SIGMA * MIN_SIGMA) {
        return Err(Error::DegenerateVariance(
            "benchmark returns have ~zero variance".to_string(),
        ));
    }

    Ok(r_a.iter().covariance(r_b.iter()) / var_b)
}

/// Perpetual size that neutralises beta-weighted spot exposure
pub fn perp_hedge_ratio(spot_qty: f64, beta: f64) -> f64 {
    spot_qty * beta
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::Utc;

    fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        let step = (end - start) / (n - 1) as f64;
        (0..n).map(|i| start + step * i as f64).collect()
    }

    fn wavy(base: f64, amplitude: f64, phase: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| base * (1.0 + amplitude * ((i as f64) * 0.7 + phase).sin()))
            .collect()
    }

    #[test]
    fn test_net_delta_of_perfect_hedge_is_zero() {
        for a in [0.0, 1.5, -3.25, 1e9, -1e-9] {
            assert_eq!(net_delta(a, -a), 0.0);
        }
        assert_eq!(net_delta(100.0, 80.0), 180.0);
    }

    #[test]
    fn test_net_delta_modes() {
        assert_eq!(net_delta_with(NetDeltaMode::Additive, 10.0, -4.0), 6.0);
        assert_eq!(net_delta_with(NetDeltaMode::SpotMinusAbsPerp, 10.0, -4.0), 6.0);
        assert_eq!(net_delta_with(NetDeltaMode::SpotMinusAbsPerp, 10.0, 4.0), 6.0);
        assert_eq!(net_delta_with(NetDeltaMode::Additive, 10.0, 4.0), 14.0);
    }

    #[test]
    fn test_threshold_limit() {
        assert_eq!(threshold_limit(100.0, 10.0).unwrap(), 10.0);
        assert_eq!(threshold_limit(-100.0, 10.0).unwrap(), 10.0);
        assert_eq!(threshold_limit(42.0, 0.0).unwrap(), 0.0);
        assert!(matches!(
            threshold_limit(100.0, -1.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(threshold_limit(100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_threshold_limit_monotonic_in_percent() {
        let mut previous = 0.0;
        for pct in [0.0, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 250.0] {
            let limit = threshold_limit(-37.5, pct).unwrap();
            assert!(limit >= previous);
            assert!(limit >= 0.0);
            previous = limit;
        }
    }

    #[test]
    fn test_needs_hedge_boundaries() {
        assert!(!needs_hedge(1.0, 1.0));
        assert!(!needs_hedge(-1.0, 1.0));
        assert!(needs_hedge(1.0 + 1e-12, 1.0));
        assert!(needs_hedge(-1.0 - 1e-12, 1.0));
        assert!(!needs_hedge(0.0, 0.0));
        assert!(needs_hedge(1e-12, 0.0));
    }

    #[test]
    fn test_evaluate_snapshot() {
        let snap = evaluate("BTC", 10.0, -4.0, 10.0, NetDeltaMode::Additive, Utc::now()).unwrap();
        assert_eq!(snap.net_delta, 6.0);
        assert_eq!(snap.threshold_limit, 1.0);
        assert!(snap.needs_hedge);
        assert_eq!(hedge_amount(snap.net_delta), 6.0);

        let balanced = evaluate("BTC", 100.0, -91.0, 10.0, NetDeltaMode::Additive, Utc::now()).unwrap();
        assert!(!balanced.needs_hedge);
    }

    #[test]
    fn test_var_parametric_is_non_negative() {
        let prices = wavy(100.0, 0.05, 0.0, 60);
        let var = value_at_risk(&prices, 0.95, 2.0).unwrap();
        assert!(var > 0.0);

        // Scales with |position|
        let short = value_at_risk(&prices, 0.95, -4.0).unwrap();
        assert_relative_eq!(short, 2.0 * var, epsilon = 1e-12);
    }

    #[test]
    fn test_var_matches_closed_form() {
        let prices = wavy(100.0, 0.03, 1.0, 40);
        let r = log_returns(&prices).unwrap();
        let z = -1.6448536269514722; // inverse_cdf(0.05)
        let expected = -(r.iter().mean() + r.iter().std_dev() * z);
        let var = value_at_risk(&prices, 0.95, 1.0).unwrap();
        assert_relative_eq!(var, expected.max(0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_var_higher_confidence_is_larger() {
        let prices = wavy(100.0, 0.05, 0.3, 80);
        let v95 = value_at_risk(&prices, 0.95, 1.0).unwrap();
        let v99 = value_at_risk(&prices, 0.99, 1.0).unwrap();
        assert!(v99 > v95);
    }

    #[test]
    fn test_var_constant_series_uses_empirical_fallback() {
        let prices = vec![100.0; 30];
        let var = value_at_risk(&prices, 0.95, 5.0).unwrap();
        assert!(!var.is_nan());
        assert_abs_diff_eq!(var, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_var_single_return_is_floored() {
        // One return: sample sigma is undefined, the empirical path applies
        let rising = value_at_risk(&[100.0, 110.0], 0.95, 1.0).unwrap();
        assert_eq!(rising, 0.0);

        let falling = value_at_risk(&[100.0, 90.0], 0.95, 2.0).unwrap();
        assert_relative_eq!(falling, -2.0 * (0.9f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_var_parameter_validation() {
        let prices = linspace(100.0, 110.0, 50);
        assert!(matches!(value_at_risk(&prices, 0.0, 1.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(value_at_risk(&prices, 1.0, 1.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(value_at_risk(&prices, 1.5, 1.0), Err(Error::InvalidParameter(_))));
        assert_eq!(
            value_at_risk(&[100.0], 0.95, 1.0),
            Err(Error::InsufficientData { needed: 2, got: 1 })
        );
    }

    #[test]
    fn test_max_drawdown() {
        assert_eq!(max_drawdown(&[100.0, 80.0, 120.0]).unwrap(), 20.0);
        assert_eq!(max_drawdown(&[0.0, 10.0, 5.0, 15.0, 7.0, 20.0, 12.0]).unwrap(), 8.0);
        assert_eq!(max_drawdown(&linspace(-5.0, 50.0, 20)).unwrap(), 0.0);
        assert_eq!(max_drawdown(&[-3.0]).unwrap(), 0.0);
        assert_eq!(
            max_drawdown(&[]),
            Err(Error::InsufficientData { needed: 1, got: 0 })
        );
    }

    #[test]
    fn test_correlation_matrix_properties() {
        let mut series = BTreeMap::new();
        series.insert("BTC".to_string(), wavy(50000.0, 0.04, 0.0, 50));
        series.insert("ETH".to_string(), wavy(3000.0, 0.06, 0.4, 50));
        series.insert("SOL".to_string(), wavy(150.0, 0.08, 2.0, 50));

        let corr = correlation_matrix(&series).unwrap();
        assert_eq!(corr.len(), 3);
        assert_eq!(corr.assets(), &["BTC", "ETH", "SOL"]);

        for i in 0..3 {
            assert_eq!(corr.values()[i][i], 1.0);
            for j in 0..3 {
                assert_abs_diff_eq!(corr.values()[i][j], corr.values()[j][i], epsilon = 1e-12);
                assert!((-1.0..=1.0).contains(&corr.values()[i][j]));
            }
        }
        assert_eq!(corr.get("ETH", "ETH"), Some(1.0));
        assert!(corr.get("BTC", "DOGE").is_none());
    }

    #[test]
    fn test_correlation_of_scaled_series_is_one() {
        let base = wavy(100.0, 0.05, 0.0, 30);
        let mut series = BTreeMap::new();
        series.insert("A".to_string(), base.clone());
        series.insert("B".to_string(), base.iter().map(|p| p * 3.0).collect());

        let corr = correlation_matrix(&series).unwrap();
        assert_relative_eq!(corr.get("A", "B").unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_correlation_rejects_misaligned_series() {
        let mut series = BTreeMap::new();
        series.insert("BTC".to_string(), linspace(100.0, 110.0, 50));
        series.insert("ETH".to_string(), linspace(50.0, 60.0, 49));

        assert!(matches!(
            correlation_matrix(&series),
            Err(Error::MisalignedSeries(_))
        ));
    }

    #[test]
    fn test_correlation_rejects_constant_series() {
        let mut series = BTreeMap::new();
        series.insert("BTC".to_string(), wavy(100.0, 0.05, 0.0, 20));
        series.insert("USDC".to_string(), vec![1.0; 20]);

        assert!(matches!(
            correlation_matrix(&series),
            Err(Error::DegenerateVariance(_))
        ));
    }

    #[test]
    fn test_beta_against_itself_is_one() {
        let prices = wavy(100.0, 0.05, 0.0, 50);
        assert_relative_eq!(beta(&prices, &prices).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_beta_and_hedge_ratio() {
        let benchmark = wavy(100.0, 0.05, 0.0, 50);
        // Asset returns roughly twice the benchmark's
        let asset: Vec<f64> = benchmark.iter().map(|p| (p / 100.0).powi(2) * 50.0).collect();

        let b = beta(&benchmark, &asset).unwrap();
        assert_relative_eq!(b, 2.0, epsilon = 1e-9);
        assert_relative_eq!(perp_hedge_ratio(3.0, b), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_beta_errors() {
        let flat = vec![100.0; 10];
        let moving = wavy(100.0, 0.05, 0.0, 10);
        assert!(matches!(beta(&flat, &moving), Err(Error::DegenerateVariance(_))));
        assert!(matches!(
            beta(&moving, &moving[..9]),
            Err(Error::MisalignedSeries(_))
        ));
    }
}
