use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Greeks;
use crate::error::Error;
use crate::instruments::OptionType;
use crate::values::{Asset, Timestamp};

/// The closed set of hedge strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Long put sized to the spot exposure
    ProtectivePut,
    /// Short call against the spot holding
    CoveredCall,
    /// Long put + short call
    Collar,
    /// Perpetual adjustment that neutralises net delta
    DeltaNeutral,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::ProtectivePut,
        StrategyKind::CoveredCall,
        StrategyKind::Collar,
        StrategyKind::DeltaNeutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::ProtectivePut => "protective_put",
            StrategyKind::CoveredCall => "covered_call",
            StrategyKind::Collar => "collar",
            StrategyKind::DeltaNeutral => "delta_neutral",
        }
    }

    /// Whether the strategy trades options (and therefore needs a volatility)
    pub fn uses_options(&self) -> bool {
        !matches!(self, StrategyKind::DeltaNeutral)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| Error::InvalidStrategy(s.to_string()))
    }
}

/// One priced option leg of a hedge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    /// Exchange instrument name (e.g. BTC-19NOV26-90000-P)
    pub instrument: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub days_to_expiry: f64,
    pub volatility: f64,
    /// Signed size: positive = bought, negative = sold
    pub size: f64,
    /// Model premium per unit
    pub premium: f64,
    /// `size * premium`: positive = paid, negative = received
    pub cost: f64,
    /// Greeks scaled by `size`
    pub greeks: Greeks,
}

/// Trade recommendation produced by one strategy invocation
///
/// Immutable once produced; appended to the per-asset hedge history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeResult {
    pub strategy: StrategyKind,
    pub asset: Asset,
    pub instrument: String,
    /// Signed size of the hedge
    pub size: f64,
    /// Positive = paid, negative = received
    pub cost: f64,
    /// None for linear (perpetual) hedges
    pub greeks: Option<Greeks>,
    /// Option legs making up the hedge, empty for perpetual hedges
    pub legs: Vec<OptionLeg>,
    pub timestamp: Timestamp,
}

impl HedgeResult {
    /// Exposure this hedge adds to the book
    ///
    /// Option hedges contribute their Greeks; perpetual hedges contribute
    /// linear delta equal to their size.
    pub fn exposure(&self) -> Greeks {
        self.greeks.unwrap_or_else(|| Greeks::linear(self.size))
    }
}
