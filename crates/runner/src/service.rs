//! Hedge Service
//!
//! The surface the command/notification layer talks to: ad-hoc risk
//! evaluation, strategy runs by name, monitoring control, history and the
//! analytics reports. Owns the scheduler and the portfolio books.

use aegis_core::{
    Asset, Error, ExchangeId, Greeks, HedgeResult, Result, RiskSnapshot, StrategyKind,
};
use aegis_portfolio::{PortfolioAnalytics, PortfolioSnapshot};
use aegis_ports::{AlertSink, Clock, MarketDataSource};
use aegis_risk::{
    CorrelationMatrix, beta, correlation_matrix, evaluate, max_drawdown, net_delta_with,
    perp_hedge_ratio, stress_pnl, stress_scenarios, value_at_risk,
};
use aegis_strategy::{StrategyEngine, StrategyParams, StrategyRequest};
use futures_util::future::{join_all, try_join_all};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BreachAction, MonitorConfig};
use crate::market::PriorityMarketData;
use crate::scheduler::{CycleReport, MonitoringScheduler};

/// VaR and drawdown of one asset's position over a lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub asset: Asset,
    pub var: f64,
    pub max_drawdown: f64,
    /// Prices in the series used
    pub observations: usize,
}

/// Beta of an asset against a benchmark and the perp size it implies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaEstimate {
    pub beta: f64,
    pub perp_hedge_ratio: f64,
}

/// Shocked P&L and shocked price paths for one asset's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressReport {
    pub asset: Asset,
    pub spot: f64,
    pub net_delta: f64,
    /// P&L per shock at the current spot
    pub pnl: Vec<f64>,
    /// Lookback series scaled by each shock
    pub paths: Vec<Vec<f64>>,
}

pub struct HedgeService {
    config: MonitorConfig,
    market: PriorityMarketData,
    engine: Arc<StrategyEngine>,
    portfolio: Arc<PortfolioAnalytics>,
    scheduler: MonitoringScheduler,
    clock: Arc<dyn Clock>,
}

impl HedgeService {
    /// Service with the zero-cost strategy engine
    pub fn new(
        config: MonitorConfig,
        market: Arc<dyn MarketDataSource>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let engine = StrategyEngine::new(config.engine_config(), Arc::clone(&clock));
        Self::with_engine(config, market, alerts, clock, engine)
    }

    pub fn with_engine(
        config: MonitorConfig,
        market: Arc<dyn MarketDataSource>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
        engine: StrategyEngine,
    ) -> Self {
        let engine = Arc::new(engine);
        let portfolio = Arc::new(PortfolioAnalytics::new());
        let scheduler = MonitoringScheduler::new(
            &config,
            Arc::clone(&market),
            Arc::clone(&engine),
            Arc::clone(&portfolio),
            alerts,
            Arc::clone(&clock),
        );

        info!(
            "[MONITOR] Hedge service ready: {} tracked assets, market data from {}",
            config.tracked.len(),
            market.name()
        );

        Self {
            config,
            market: PriorityMarketData::new(market),
            engine,
            portfolio,
            scheduler,
            clock,
        }
    }

    pub fn scheduler(&self) -> &MonitoringScheduler {
        &self.scheduler
    }

    pub fn portfolio(&self) -> &Arc<PortfolioAnalytics> {
        &self.portfolio
    }

    /// Exchange preference for an asset: tracked list, else default priority
    fn exchanges(&self, asset: &str) -> Vec<ExchangeId> {
        self.scheduler
            .tracked()
            .into_iter()
            .find(|t| t.asset == asset)
            .map(|t| t.exchanges)
            .unwrap_or_else(|| ExchangeId::PRIORITY.to_vec())
    }

    fn lookback(&self, days: Option<u32>) -> u32 {
        days.unwrap_or(self.config.lookback_days)
    }

    fn confidence(&self, confidence: Option<f64>) -> f64 {
        confidence.unwrap_or(self.config.var_confidence)
    }

    /// Risk snapshot for explicit sizes; stored as the asset's last snapshot
    pub fn evaluate_risk(
        &self,
        asset: &str,
        spot_size: f64,
        perp_size: f64,
        threshold_percent: f64,
    ) -> Result<RiskSnapshot> {
        let snapshot = evaluate(
            asset,
            spot_size,
            perp_size,
            threshold_percent,
            self.engine.config().net_delta_mode,
            self.clock.now(),
        )?;
        self.portfolio.update_snapshot(snapshot.clone());
        Ok(snapshot)
    }

    /// Run a strategy by name and record the result
    ///
    /// Option strategies missing `spot_price` or `volatility` have them
    /// fetched from market data.
    pub async fn run_strategy(&self, name: &str, params: &StrategyParams) -> Result<HedgeResult> {
        let kind: StrategyKind = name.parse()?;
        let mut params = params.clone();

        if kind.uses_options() {
            if params.spot_price.is_none() {
                let (exchange, price) = self
                    .market
                    .fetch_spot_price(&params.asset, &self.exchanges(&params.asset))
                    .await?;
                debug!("[STRATEGY] {} spot {price} from {exchange}", params.asset);
                params.spot_price = Some(price);
            }
            if params.volatility.is_none() {
                let days = params.days.unwrap_or(self.config.option_defaults.days);
                params.volatility =
                    Some(self.market.fetch_option_market(&params.asset, days.ceil() as u32).await?);
            }
        }

        let request = StrategyRequest::build(kind, &params)?;
        let result = self.engine.run(&request)?;
        self.portfolio.record(result.clone());
        Ok(result)
    }

    pub fn start_monitoring(&self) -> bool {
        self.scheduler.start()
    }

    pub fn stop_monitoring(&self) -> bool {
        self.scheduler.stop()
    }

    pub fn is_monitoring(&self) -> bool {
        self.scheduler.is_running()
    }

    /// One monitoring pass right now
    pub async fn run_cycle(&self) -> CycleReport {
        self.scheduler.run_cycle().await
    }

    /// Runtime reconfiguration of threshold and period
    pub fn configure(&self, threshold_percent: Option<f64>, interval_secs: Option<u64>) -> Result<()> {
        if let Some(pct) = threshold_percent {
            self.scheduler.set_threshold(pct)?;
        }
        if let Some(secs) = interval_secs {
            self.scheduler.set_interval(Duration::from_secs(secs))?;
        }
        Ok(())
    }

    /// Switch between alerting and hedging on breach; applies next cycle
    pub fn set_breach_action(&self, action: BreachAction) {
        self.scheduler.set_breach_action(action);
        info!("[MONITOR] Breach action set to {action:?}");
    }

    /// Last `n` hedges for an asset, most recent first
    pub fn get_history(&self, asset: &str, n: usize) -> Vec<HedgeResult> {
        self.portfolio.history(asset, n)
    }

    pub fn last_hedge(&self, asset: &str) -> Option<HedgeResult> {
        self.portfolio.last_hedge(asset)
    }

    /// VaR of the asset's spot holding over the last `days`
    ///
    /// `None` falls back to the configured lookback and confidence.
    pub async fn compute_var(
        &self,
        asset: &str,
        days: Option<u32>,
        confidence: Option<f64>,
    ) -> Result<f64> {
        let (days, confidence) = (self.lookback(days), self.confidence(confidence));
        let exchanges = self.exchanges(asset);
        let (series, position) = futures_util::try_join!(
            self.market.fetch_price_series(asset, &exchanges, days),
            self.market.fetch_position(asset, &exchanges),
        )?;
        value_at_risk(&series.prices(), confidence, position.spot_size)
    }

    /// Correlation of log returns; all series come from one joined fetch
    pub async fn compute_correlation(
        &self,
        assets: &[&str],
        days: Option<u32>,
    ) -> Result<CorrelationMatrix> {
        let distinct: BTreeSet<&str> = assets.iter().copied().collect();
        if distinct.len() != assets.len() {
            return Err(Error::invalid(format!("duplicate assets in {assets:?}")));
        }
        let days = self.lookback(days);
        let fetches = assets.iter().map(|&asset| {
            let exchanges = self.exchanges(asset);
            async move {
                let series = self.market.fetch_price_series(asset, &exchanges, days).await?;
                Ok::<_, Error>((asset.to_string(), series.prices()))
            }
        });
        let series: BTreeMap<Asset, Vec<f64>> = try_join_all(fetches).await?.into_iter().collect();
        correlation_matrix(&series)
    }

    /// Beta of `asset` against `benchmark`, sized against the asset's spot holding
    pub async fn compute_beta(
        &self,
        benchmark: &str,
        asset: &str,
        days: Option<u32>,
    ) -> Result<BetaEstimate> {
        let days = self.lookback(days);
        let (bench_ex, asset_ex) = (self.exchanges(benchmark), self.exchanges(asset));
        let (bench_series, asset_series, position) = futures_util::try_join!(
            self.market.fetch_price_series(benchmark, &bench_ex, days),
            self.market.fetch_price_series(asset, &asset_ex, days),
            self.market.fetch_position(asset, &asset_ex),
        )?;

        let b = beta(&bench_series.prices(), &asset_series.prices())?;
        Ok(BetaEstimate {
            beta: b,
            perp_hedge_ratio: perp_hedge_ratio(position.spot_size, b),
        })
    }

    /// VaR of the spot holding and max drawdown of `(p_t - p_0) * net_delta`
    pub async fn risk_report(
        &self,
        asset: &str,
        days: Option<u32>,
        confidence: Option<f64>,
    ) -> Result<RiskReport> {
        let (days, confidence) = (self.lookback(days), self.confidence(confidence));
        let exchanges = self.exchanges(asset);
        let (series, position) = futures_util::try_join!(
            self.market.fetch_price_series(asset, &exchanges, days),
            self.market.fetch_position(asset, &exchanges),
        )?;
        let prices = series.prices();
        let var = value_at_risk(&prices, confidence, position.spot_size)?;

        let net = net_delta_with(
            self.engine.config().net_delta_mode,
            position.spot_size,
            position.perp_size,
        );
        let p0 = prices.first().copied().unwrap_or_default();
        let pnl: Vec<f64> = prices.iter().map(|p| (p - p0) * net).collect();

        Ok(RiskReport {
            asset: asset.to_string(),
            var,
            max_drawdown: max_drawdown(&pnl)?,
            observations: prices.len(),
        })
    }

    /// Position P&L and shocked price paths for each fractional price shock
    pub async fn stress_test(
        &self,
        asset: &str,
        shocks: &[f64],
        days: Option<u32>,
    ) -> Result<StressReport> {
        let days = self.lookback(days);
        let exchanges = self.exchanges(asset);
        let (series, (_, spot), position) = futures_util::try_join!(
            self.market.fetch_price_series(asset, &exchanges, days),
            self.market.fetch_spot_price(asset, &exchanges),
            self.market.fetch_position(asset, &exchanges),
        )?;
        let net_delta = net_delta_with(
            self.engine.config().net_delta_mode,
            position.spot_size,
            position.perp_size,
        );

        Ok(StressReport {
            asset: asset.to_string(),
            spot,
            net_delta,
            pnl: stress_pnl(net_delta, spot, shocks),
            paths: stress_scenarios(&series.prices(), shocks),
        })
    }

    /// Aggregate Greeks and P&L with option legs marked at current prices
    ///
    /// Marks that cannot be fetched leave the leg at its entry premium.
    pub async fn portfolio_snapshot(&self, asset: &str) -> PortfolioSnapshot {
        let instruments = self.portfolio.open_instruments(asset);
        let marks: HashMap<String, f64> = join_all(instruments.into_iter().map(|instrument| async move {
            let mark = self.market.source().fetch_instrument_price(&instrument).await;
            (instrument, mark)
        }))
        .await
        .into_iter()
        .filter_map(|(instrument, mark)| mark.ok().map(|m| (instrument, m)))
        .collect();

        self.portfolio.snapshot(asset, &marks)
    }

    /// Sum of aggregate Greeks over every asset
    pub fn portfolio_greeks(&self) -> Greeks {
        self.portfolio.total_greeks()
    }
}
