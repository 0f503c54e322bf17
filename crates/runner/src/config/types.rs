use aegis_core::{Asset, ExchangeId, StrategyKind};
use aegis_risk::NetDeltaMode;
use aegis_strategy::{EngineConfig, PutSizing};
use serde::{Deserialize, Serialize};

/// What monitoring does when an asset breaches its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachAction {
    /// Publish a `ThresholdBreached` event only
    #[default]
    AlertOnly,
    /// Run the default strategy and record the result
    Hedge,
}

/// Strikes and expiry used when monitoring triggers an option strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionDefaults {
    /// Put strike as a fraction of spot
    pub put_strike_ratio: f64,
    /// Call strike as a fraction of spot
    pub call_strike_ratio: f64,
    pub days: f64,
}

impl Default for OptionDefaults {
    fn default() -> Self {
        Self {
            put_strike_ratio: 0.9,
            call_strike_ratio: 1.1,
            days: 30.0,
        }
    }
}

/// An asset under monitoring with its exchange preference (first = preferred)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAsset {
    pub asset: Asset,
    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<ExchangeId>,
}

fn default_exchanges() -> Vec<ExchangeId> {
    ExchangeId::PRIORITY.to_vec()
}

impl TrackedAsset {
    pub fn new(asset: impl Into<Asset>, exchanges: Vec<ExchangeId>) -> Self {
        Self {
            asset: asset.into(),
            exchanges,
        }
    }
}

/// Monitoring configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub threshold_percent: f64,
    pub risk_free_rate: f64,
    /// Assets fetched concurrently per cycle
    pub max_concurrency: usize,
    pub breach_action: BreachAction,
    pub default_strategy: StrategyKind,
    pub option_defaults: OptionDefaults,
    pub net_delta_mode: NetDeltaMode,
    pub put_sizing: PutSizing,
    pub lookback_days: u32,
    pub var_confidence: f64,
    pub tracked: Vec<TrackedAsset>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            threshold_percent: 10.0,
            risk_free_rate: 0.0,
            max_concurrency: 4,
            breach_action: BreachAction::AlertOnly,
            default_strategy: StrategyKind::DeltaNeutral,
            option_defaults: OptionDefaults::default(),
            net_delta_mode: NetDeltaMode::Additive,
            put_sizing: PutSizing::Notional,
            lookback_days: 30,
            var_confidence: 0.95,
            tracked: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            risk_free_rate: self.risk_free_rate,
            put_sizing: self.put_sizing,
            net_delta_mode: self.net_delta_mode,
        }
    }

    pub fn tracked_asset(&self, asset: &str) -> Option<&TrackedAsset> {
        self.tracked.iter().find(|t| t.asset == asset)
    }
}
