//! Events emitted by monitoring to the external notification layer

use serde::{Deserialize, Serialize};

use crate::entities::{HedgeResult, RiskSnapshot};
use crate::instruments::ExchangeId;
use crate::values::Asset;

/// Spot and perpetual prices seen at breach time; `None` where the fetch failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub spot: Option<f64>,
    pub perp: Option<f64>,
}

impl Quote {
    /// Perpetual premium over spot
    pub fn basis(&self) -> Option<f64> {
        Some(self.perp? - self.spot?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Net delta exceeded the threshold; no hedge was executed
    ThresholdBreached { snapshot: RiskSnapshot, quote: Quote },
    /// A hedge was computed and recorded
    HedgeExecuted {
        snapshot: RiskSnapshot,
        result: HedgeResult,
        quote: Quote,
    },
    /// Market data could not be fetched for an asset this cycle
    DataUnavailable {
        asset: Asset,
        exchanges: Vec<ExchangeId>,
        reason: String,
    },
}

impl MonitorEvent {
    pub fn asset(&self) -> &str {
        match self {
            MonitorEvent::ThresholdBreached { snapshot, .. } => &snapshot.asset,
            MonitorEvent::HedgeExecuted { snapshot, .. } => &snapshot.asset,
            MonitorEvent::DataUnavailable { asset, .. } => asset,
        }
    }
}
