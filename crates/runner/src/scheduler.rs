//! Monitoring Scheduler
//!
//! Periodic risk evaluation over every tracked asset.
//!
//! ## State machine
//!
//! ```text
//!            start()             
//!  STOPPED ──────────► RUNNING
//!     ▲                   │
//!     └───────────────────┘
//!            stop()
//! ```
//!
//! Both transitions are idempotent and safe from concurrent callers. Each
//! start spawns a loop tagged with a fresh generation; a loop exits as soon
//! as it is no longer the current generation, so rapid stop/start never
//! leaves two loops running. A stop takes effect before the next cycle; a
//! stop that lands mid-cycle is still seen by the wait that follows it.

use aegis_core::{
    Asset, Error, HedgeResult, MonitorEvent, Position, Quote, Result, RiskSnapshot, StrategyKind,
};
use aegis_ports::{AlertSink, Clock, MarketDataSource};
use aegis_portfolio::PortfolioAnalytics;
use aegis_risk::evaluate;
use aegis_strategy::{StrategyEngine, StrategyParams, StrategyRequest};
use futures_util::{StreamExt, stream};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use crate::config::{BreachAction, MonitorConfig, OptionDefaults, TrackedAsset};
use crate::market::PriorityMarketData;

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

/// Runtime-adjustable monitoring settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub threshold_percent: f64,
    pub interval: Duration,
    pub max_concurrency: usize,
    pub breach_action: BreachAction,
    pub default_strategy: StrategyKind,
    pub option_defaults: OptionDefaults,
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            threshold_percent: config.threshold_percent,
            interval: Duration::from_secs(config.interval_secs),
            max_concurrency: config.max_concurrency.max(1),
            breach_action: config.breach_action,
            default_strategy: config.default_strategy,
            option_defaults: config.option_defaults,
        }
    }
}

/// Per-asset failure within a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFailure {
    pub asset: Asset,
    pub error: Error,
}

/// Outcome of one monitoring cycle, sorted by asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub snapshots: Vec<RiskSnapshot>,
    pub hedges: Vec<HedgeResult>,
    pub failures: Vec<AssetFailure>,
}

impl CycleReport {
    pub fn breaches(&self) -> usize {
        self.snapshots.iter().filter(|s| s.needs_hedge).count()
    }

    pub fn failed_assets(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.asset.as_str()).collect()
    }
}

struct Inner {
    state: AtomicU8,
    generation: AtomicU64,
    /// Bumped on every stop; each loop watches from its own start
    stop_signal: watch::Sender<u64>,
    settings: RwLock<MonitorSettings>,
    tracked: RwLock<Vec<TrackedAsset>>,
    market: PriorityMarketData,
    engine: Arc<StrategyEngine>,
    portfolio: Arc<PortfolioAnalytics>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
}

/// Handle to the monitoring loop; clones share state
#[derive(Clone)]
pub struct MonitoringScheduler {
    inner: Arc<Inner>,
}

impl MonitoringScheduler {
    pub fn new(
        config: &MonitorConfig,
        market: Arc<dyn MarketDataSource>,
        engine: Arc<StrategyEngine>,
        portfolio: Arc<PortfolioAnalytics>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(STOPPED),
                generation: AtomicU64::new(0),
                stop_signal: watch::Sender::new(0),
                settings: RwLock::new(MonitorSettings::from(config)),
                tracked: RwLock::new(config.tracked.clone()),
                market: PriorityMarketData::new(market),
                engine,
                portfolio,
                alerts,
                clock,
            }),
        }
    }

    pub fn state(&self) -> MonitorState {
        match self.inner.state.load(Ordering::SeqCst) {
            RUNNING => MonitorState::Running,
            _ => MonitorState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    /// Start the periodic loop; returns `false` if it was already running
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        if self
            .inner
            .state
            .compare_exchange(STOPPED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("[MONITOR] start ignored: already running");
            return false;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let stop = self.inner.stop_signal.subscribe();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_loop(generation, stop).await });

        info!(
            "[MONITOR] Started (generation {generation}, every {:?})",
            self.inner.settings.read().interval
        );
        true
    }

    /// Stop the loop; returns `false` if it was already stopped
    pub fn stop(&self) -> bool {
        if self
            .inner
            .state
            .compare_exchange(RUNNING, STOPPED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("[MONITOR] stop ignored: not running");
            return false;
        }
        self.inner.stop_signal.send_modify(|stops| *stops += 1);
        info!("[MONITOR] Stopped");
        true
    }

    /// Run one cycle immediately, independent of the loop
    pub async fn run_cycle(&self) -> CycleReport {
        self.inner.run_cycle().await
    }

    pub fn settings(&self) -> MonitorSettings {
        *self.inner.settings.read()
    }

    pub fn set_threshold(&self, threshold_percent: f64) -> Result<()> {
        if !(threshold_percent >= 0.0) {
            return Err(Error::invalid(format!(
                "threshold_percent must be >= 0, got {threshold_percent}"
            )));
        }
        self.inner.settings.write().threshold_percent = threshold_percent;
        info!("[MONITOR] Threshold set to {threshold_percent}%");
        Ok(())
    }

    /// New period applies from the next wait
    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::invalid("monitoring interval must be > 0"));
        }
        self.inner.settings.write().interval = interval;
        info!("[MONITOR] Interval set to {interval:?}");
        Ok(())
    }

    pub fn set_breach_action(&self, action: BreachAction) {
        self.inner.settings.write().breach_action = action;
    }

    /// Add an asset, or replace its exchange preference
    pub fn track(&self, tracked: TrackedAsset) {
        let mut list = self.inner.tracked.write();
        match list.iter_mut().find(|t| t.asset == tracked.asset) {
            Some(existing) => *existing = tracked,
            None => list.push(tracked),
        }
    }

    pub fn untrack(&self, asset: &str) -> bool {
        let mut list = self.inner.tracked.write();
        let before = list.len();
        list.retain(|t| t.asset != asset);
        list.len() != before
    }

    pub fn tracked(&self) -> Vec<TrackedAsset> {
        self.inner.tracked.read().clone()
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
            && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_loop(&self, generation: u64, mut stop: watch::Receiver<u64>) {
        while self.is_current(generation) {
            let report = self.run_cycle().await;
            debug!(
                "[MONITOR] Cycle done: {} assets, {} breaches, {} hedges, {} failures",
                report.snapshots.len(),
                report.breaches(),
                report.hedges.len(),
                report.failures.len()
            );

            let interval = self.settings.read().interval;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stop.changed() => {}
            }
        }
        debug!("[MONITOR] Loop generation {generation} exited");
    }

    async fn run_cycle(&self) -> CycleReport {
        let tracked = self.tracked.read().clone();
        let settings = *self.settings.read();

        let outcomes: Vec<(Asset, Result<(RiskSnapshot, Option<HedgeResult>)>)> =
            stream::iter(tracked)
                .map(|t| async move {
                    let outcome = self.process_asset(&t, &settings).await;
                    (t.asset, outcome)
                })
                .buffer_unordered(settings.max_concurrency)
                .collect()
                .await;

        let mut report = CycleReport::default();
        for (asset, outcome) in outcomes {
            match outcome {
                Ok((snapshot, hedge)) => {
                    report.snapshots.push(snapshot);
                    report.hedges.extend(hedge);
                }
                Err(error) => report.failures.push(AssetFailure { asset, error }),
            }
        }
        report.snapshots.sort_by(|a, b| a.asset.cmp(&b.asset));
        report.hedges.sort_by(|a, b| a.asset.cmp(&b.asset));
        report.failures.sort_by(|a, b| a.asset.cmp(&b.asset));
        report
    }

    async fn process_asset(
        &self,
        tracked: &TrackedAsset,
        settings: &MonitorSettings,
    ) -> Result<(RiskSnapshot, Option<HedgeResult>)> {
        let result = self.evaluate_asset(tracked, settings).await;

        if let Err(e) = &result {
            match e {
                Error::DataUnavailable { reason, .. } => {
                    warn!("[MONITOR] {} skipped this cycle: {reason}", tracked.asset);
                    self.alerts
                        .publish(MonitorEvent::DataUnavailable {
                            asset: tracked.asset.clone(),
                            exchanges: tracked.exchanges.clone(),
                            reason: reason.clone(),
                        })
                        .await;
                }
                other => error!("[MONITOR] {} evaluation failed: {other}", tracked.asset),
            }
        }
        result
    }

    async fn evaluate_asset(
        &self,
        tracked: &TrackedAsset,
        settings: &MonitorSettings,
    ) -> Result<(RiskSnapshot, Option<HedgeResult>)> {
        let asset = tracked.asset.as_str();
        let position = self.market.fetch_position(asset, &tracked.exchanges).await?;

        let snapshot = evaluate(
            asset,
            position.spot_size,
            position.perp_size,
            settings.threshold_percent,
            self.engine.config().net_delta_mode,
            self.clock.now(),
        )?;
        self.portfolio.update_snapshot(snapshot.clone());

        if !snapshot.needs_hedge {
            debug!(
                "[MONITOR] {asset} ok: net delta {:.4} within {:.4}",
                snapshot.net_delta, snapshot.threshold_limit
            );
            return Ok((snapshot, None));
        }

        warn!(
            "[MONITOR] {asset} breach: |{:.4}| > {:.4}",
            snapshot.net_delta, snapshot.threshold_limit
        );

        let (spot, perp) = tokio::join!(
            self.market.fetch_spot_price(asset, &tracked.exchanges),
            self.market.fetch_perp_price(asset, &tracked.exchanges),
        );
        let spot = spot.map(|(_, price)| price);
        let quote = Quote {
            spot: spot.as_ref().ok().copied(),
            perp: perp.ok().map(|(_, price)| price),
        };

        match settings.breach_action {
            BreachAction::AlertOnly => {
                self.alerts
                    .publish(MonitorEvent::ThresholdBreached {
                        snapshot: snapshot.clone(),
                        quote,
                    })
                    .await;
                Ok((snapshot, None))
            }
            BreachAction::Hedge => {
                let request = self.breach_request(tracked, &position, spot, settings).await?;
                let result = self.engine.run(&request)?;
                self.portfolio.record(result.clone());
                self.alerts
                    .publish(MonitorEvent::HedgeExecuted {
                        snapshot: snapshot.clone(),
                        result: result.clone(),
                        quote,
                    })
                    .await;
                Ok((snapshot, Some(result)))
            }
        }
    }

    /// Request for the default strategy
    ///
    /// Perpetual hedges trade on the exchange that reported the position.
    /// Option strategies need the spot price and fetch the implied vol.
    async fn breach_request(
        &self,
        tracked: &TrackedAsset,
        position: &Position,
        spot: Result<f64>,
        settings: &MonitorSettings,
    ) -> Result<StrategyRequest> {
        let kind = settings.default_strategy;
        let mut params = StrategyParams {
            perp_qty: position.perp_size,
            threshold_percent: Some(settings.threshold_percent),
            exchange: Some(position.exchange),
            ..StrategyParams::new(tracked.asset.clone(), position.spot_size)
        };

        if kind.uses_options() {
            let defaults = settings.option_defaults;
            let spot_price = spot?;
            let volatility = self
                .market
                .fetch_option_market(&tracked.asset, defaults.days.ceil() as u32)
                .await?;

            let single_strike_ratio = match kind {
                StrategyKind::CoveredCall => defaults.call_strike_ratio,
                _ => defaults.put_strike_ratio,
            };
            params.strike = Some(spot_price * single_strike_ratio);
            params.put_strike = Some(spot_price * defaults.put_strike_ratio);
            params.call_strike = Some(spot_price * defaults.call_strike_ratio);
            params.days = Some(defaults.days);
            params.volatility = Some(volatility);
            params.spot_price = Some(spot_price);
        }

        StrategyRequest::build(kind, &params)
    }
}
