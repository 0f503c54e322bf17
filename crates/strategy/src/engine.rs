//! Strategy Engine
//!
//! Stateless hedge construction. Reads the clock once per invocation so all
//! legs of a hedge share the same timestamp and expiry.

use aegis_core::{
    Asset, ExchangeId, Greeks, HedgeResult, InstrumentKind, OptionLeg, OptionType, Result,
    StrategyKind, Timestamp,
};
use aegis_options::{HedgeParams, OptionsHedger};
use aegis_ports::{Clock, CostAdjuster};
use aegis_risk::{NetDeltaMode, evaluate, hedge_amount};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cost::ZeroCost;
use crate::request::StrategyRequest;

/// How many puts a protective put buys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutSizing {
    /// One put per unit of spot
    #[default]
    Notional,
    /// `ceil(spot_qty / |put delta|)` puts
    DeltaMatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub risk_free_rate: f64,
    pub put_sizing: PutSizing,
    pub net_delta_mode: NetDeltaMode,
}

pub struct StrategyEngine {
    config: EngineConfig,
    cost: Arc<dyn CostAdjuster>,
    clock: Arc<dyn Clock>,
}

impl StrategyEngine {
    /// Engine with the zero-cost adjuster
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            cost: Arc::new(ZeroCost),
            clock,
        }
    }

    pub fn with_cost_adjuster(mut self, cost: Arc<dyn CostAdjuster>) -> Self {
        debug!("[STRATEGY] Cost adjuster: {}", cost.name());
        self.cost = cost;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Dispatch a tagged request to its strategy
    pub fn run(&self, request: &StrategyRequest) -> Result<HedgeResult> {
        match request {
            StrategyRequest::ProtectivePut {
                asset,
                spot_qty,
                strike,
                days,
                volatility,
                spot_price,
            } => self.protective_put(asset, *spot_qty, *strike, *days, *volatility, *spot_price),
            StrategyRequest::CoveredCall {
                asset,
                spot_qty,
                strike,
                days,
                volatility,
                spot_price,
            } => self.covered_call(asset, *spot_qty, *strike, *days, *volatility, *spot_price),
            StrategyRequest::Collar {
                asset,
                spot_qty,
                put_strike,
                call_strike,
                days,
                volatility,
                spot_price,
            } => self.collar(
                asset,
                *spot_qty,
                *put_strike,
                *call_strike,
                *days,
                *volatility,
                *spot_price,
            ),
            StrategyRequest::DeltaNeutral {
                asset,
                exchange,
                spot_qty,
                perp_qty,
                threshold_percent,
            } => self.delta_neutral(asset, *exchange, *spot_qty, *perp_qty, *threshold_percent),
        }
    }

    /// Long put; size is `spot_qty` (or delta-matched), cost is the premium paid
    pub fn protective_put(
        &self,
        asset: &str,
        spot_qty: f64,
        strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    ) -> Result<HedgeResult> {
        let now = self.clock.now();
        let hedger = self.hedger(spot_qty, strike, days, volatility, spot_price)?;
        let size = match self.config.put_sizing {
            PutSizing::Notional => spot_qty,
            PutSizing::DeltaMatched => hedger.delta_matched_put_qty()?,
        };
        let leg = hedger.price_leg(asset, OptionType::Put, size, now)?;

        Ok(self.option_result(StrategyKind::ProtectivePut, asset, size, vec![leg], now))
    }

    /// Short call; size is `-spot_qty`, cost is negative (premium received)
    pub fn covered_call(
        &self,
        asset: &str,
        spot_qty: f64,
        strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    ) -> Result<HedgeResult> {
        let now = self.clock.now();
        let hedger = self.hedger(spot_qty, strike, days, volatility, spot_price)?;
        let size = -spot_qty;
        let leg = hedger.price_leg(asset, OptionType::Call, size, now)?;

        Ok(self.option_result(StrategyKind::CoveredCall, asset, size, vec![leg], now))
    }

    /// Long put + short call, both sized `spot_qty`
    ///
    /// Net cost is put premium minus call premium; instrument is
    /// `"<put>/<call>"`.
    #[allow(clippy::too_many_arguments)]
    pub fn collar(
        &self,
        asset: &str,
        spot_qty: f64,
        put_strike: f64,
        call_strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    ) -> Result<HedgeResult> {
        let now = self.clock.now();
        let put = self
            .hedger(spot_qty, put_strike, days, volatility, spot_price)?
            .price_leg(asset, OptionType::Put, spot_qty, now)?;
        let call = self
            .hedger(spot_qty, call_strike, days, volatility, spot_price)?
            .price_leg(asset, OptionType::Call, -spot_qty, now)?;

        Ok(self.option_result(StrategyKind::Collar, asset, spot_qty, vec![put, call], now))
    }

    /// Perpetual adjustment `-net_delta` when the threshold is breached,
    /// size 0 otherwise; no premium and no Greeks
    ///
    /// The instrument is the exchange's perpetual symbol.
    pub fn delta_neutral(
        &self,
        asset: &str,
        exchange: ExchangeId,
        spot_qty: f64,
        perp_qty: f64,
        threshold_percent: f64,
    ) -> Result<HedgeResult> {
        let now = self.clock.now();
        let snapshot = evaluate(
            asset,
            spot_qty,
            perp_qty,
            threshold_percent,
            self.config.net_delta_mode,
            now,
        )?;

        let size = if snapshot.needs_hedge {
            -hedge_amount(snapshot.net_delta)
        } else {
            debug!(
                "[STRATEGY] {asset} within threshold: |{:.4}| <= {:.4}",
                snapshot.net_delta, snapshot.threshold_limit
            );
            0.0
        };
        let cost = self.cost.adjust(StrategyKind::DeltaNeutral, size, 0.0);

        let result = HedgeResult {
            strategy: StrategyKind::DeltaNeutral,
            asset: Asset::from(asset),
            instrument: exchange.symbol(asset, InstrumentKind::Perpetual),
            size,
            cost,
            greeks: None,
            legs: Vec::new(),
            timestamp: now,
        };
        info!(
            "[STRATEGY] {} {}: perp adjustment {:.4} (net delta {:.4})",
            result.strategy, asset, size, snapshot.net_delta
        );
        Ok(result)
    }

    fn hedger(
        &self,
        spot_qty: f64,
        strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    ) -> Result<OptionsHedger> {
        OptionsHedger::new(HedgeParams {
            spot_qty,
            strike,
            days_to_expiry: days,
            volatility,
            spot_price,
            risk_free_rate: self.config.risk_free_rate,
        })
    }

    fn option_result(
        &self,
        strategy: StrategyKind,
        asset: &str,
        size: f64,
        legs: Vec<OptionLeg>,
        timestamp: Timestamp,
    ) -> HedgeResult {
        let model_cost: f64 = legs.iter().map(|leg| leg.cost).sum();
        let greeks: Greeks = legs.iter().map(|leg| leg.greeks).sum();
        let instrument = legs
            .iter()
            .map(|leg| leg.instrument.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let cost = self.cost.adjust(strategy, size, model_cost);

        info!(
            "[STRATEGY] {} {}: {} size {:.4} cost {:.4} delta {:.4}",
            strategy, asset, instrument, size, cost, greeks.delta
        );

        HedgeResult {
            strategy,
            asset: Asset::from(asset),
            instrument,
            size,
            cost,
            greeks: Some(greeks),
            legs,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::LinearFee;
    use aegis_clock::ManualClock;
    use aegis_core::Error;
    use aegis_options::BlackScholes;
    use approx::assert_abs_diff_eq;
    use chrono::{TimeZone, Utc};

    fn engine(config: EngineConfig) -> StrategyEngine {
        let clock = ManualClock::at(Utc.with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap());
        StrategyEngine::new(config, Arc::new(clock))
    }

    #[test]
    fn test_protective_put() {
        let result = engine(EngineConfig::default())
            .protective_put("BTC", 2.0, 90_000.0, 30.0, 0.6, 100_000.0)
            .unwrap();

        assert_eq!(result.strategy, StrategyKind::ProtectivePut);
        assert_eq!(result.instrument, "BTC-19NOV26-90000-P");
        assert_eq!(result.size, 2.0);
        assert!(result.cost > 0.0);
        assert_eq!(result.legs.len(), 1);
        let greeks = result.greeks.unwrap();
        assert!(greeks.delta < 0.0);
        assert!(greeks.gamma > 0.0);
        assert_eq!(result.timestamp, Utc.with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_protective_put_delta_matched() {
        let config = EngineConfig {
            put_sizing: PutSizing::DeltaMatched,
            ..Default::default()
        };
        let result = engine(config)
            .protective_put("BTC", 2.0, 90_000.0, 30.0, 0.6, 100_000.0)
            .unwrap();

        let put_delta = BlackScholes::new(100_000.0, 90_000.0, 30.0, 0.0, 0.6)
            .unwrap()
            .greeks(OptionType::Put)
            .delta;
        assert_eq!(result.size, (2.0 / put_delta.abs()).ceil());
        assert!(result.size > 2.0);
    }

    #[test]
    fn test_covered_call_receives_premium() {
        let result = engine(EngineConfig::default())
            .covered_call("ETH", 5.0, 3300.0, 14.0, 0.7, 3000.0)
            .unwrap();

        assert_eq!(result.size, -5.0);
        assert!(result.cost < 0.0);
        assert!(result.instrument.ends_with("-3300-C"));
        assert!(result.greeks.unwrap().delta < 0.0);
    }

    #[test]
    fn test_collar_cost_is_put_minus_call_premium() {
        let spot = 1.0;
        let result = engine(EngineConfig::default())
            .collar("BTC", 1.0, 0.9 * spot, 1.1 * spot, 30.0, 0.6, spot)
            .unwrap();

        let put_premium = BlackScholes::new(spot, 0.9 * spot, 30.0, 0.0, 0.6)
            .unwrap()
            .price(OptionType::Put);
        let call_premium = BlackScholes::new(spot, 1.1 * spot, 30.0, 0.0, 0.6)
            .unwrap()
            .price(OptionType::Call);

        assert_abs_diff_eq!(result.cost, put_premium - call_premium, epsilon = 1e-6);
        assert_eq!(result.size, 1.0);
        assert_eq!(result.legs.len(), 2);
        assert_eq!(result.legs[0].option_type, OptionType::Put);
        assert_eq!(result.legs[1].size, -1.0);
        assert_eq!(
            result.instrument,
            format!("{}/{}", result.legs[0].instrument, result.legs[1].instrument)
        );

        let combined = result.legs[0].greeks + result.legs[1].greeks;
        assert_abs_diff_eq!(result.greeks.unwrap().delta, combined.delta, epsilon = 1e-12);
    }

    #[test]
    fn test_delta_neutral_breach() {
        let result = engine(EngineConfig::default())
            .delta_neutral("BTC", ExchangeId::Deribit, 10.0, -4.0, 10.0)
            .unwrap();

        assert_eq!(result.strategy, StrategyKind::DeltaNeutral);
        assert_eq!(result.size, -6.0);
        assert_eq!(result.cost, 0.0);
        assert!(result.greeks.is_none());
        assert!(result.legs.is_empty());
        assert_eq!(result.instrument, "BTC-PERPETUAL");
    }

    #[test]
    fn test_delta_neutral_names_exchange_perpetual() {
        let engine = engine(EngineConfig::default());

        let okx = engine.delta_neutral("eth", ExchangeId::Okx, 10.0, -4.0, 10.0).unwrap();
        assert_eq!(okx.instrument, "ETH-USDT-SWAP");
        assert_eq!(okx.size, -6.0);

        let bybit = engine.delta_neutral("SOL", ExchangeId::Bybit, 10.0, -4.0, 10.0).unwrap();
        assert_eq!(bybit.instrument, "SOLUSDT");
    }

    #[test]
    fn test_delta_neutral_within_threshold() {
        let result = engine(EngineConfig::default())
            .delta_neutral("BTC", ExchangeId::Deribit, 10.0, -9.5, 10.0)
            .unwrap();
        assert_eq!(result.size, 0.0);
    }

    #[test]
    fn test_delta_neutral_alternative_net_delta() {
        let config = EngineConfig {
            net_delta_mode: NetDeltaMode::SpotMinusAbsPerp,
            ..Default::default()
        };
        // spot - |perp| = 10 - 4 = 6, regardless of the perp's sign
        let result = engine(config)
            .delta_neutral("BTC", ExchangeId::Deribit, 10.0, 4.0, 10.0)
            .unwrap();
        assert_eq!(result.size, -6.0);
    }

    #[test]
    fn test_cost_adjuster_applies() {
        let engine = engine(EngineConfig::default()).with_cost_adjuster(Arc::new(LinearFee::new(0.25)));
        let result = engine.delta_neutral("BTC", ExchangeId::Deribit, 10.0, -4.0, 10.0).unwrap();
        assert_eq!(result.cost, 1.5);
    }

    #[test]
    fn test_invalid_inputs_surface() {
        let engine = engine(EngineConfig::default());
        assert!(matches!(
            engine.protective_put("BTC", 1.0, 90_000.0, 0.0, 0.6, 100_000.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            engine.delta_neutral("BTC", ExchangeId::Deribit, 1.0, 0.0, -5.0),
            Err(Error::InvalidParameter(_))
        ));
    }
}
