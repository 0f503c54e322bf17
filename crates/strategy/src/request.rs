//! Strategy selection
//!
//! Names resolve to a closed set of tagged requests; an unknown name fails
//! with `InvalidStrategy` before any parameter is looked at.

use aegis_core::{Asset, Error, ExchangeId, Result, StrategyKind};
use serde::{Deserialize, Serialize};

/// One fully specified strategy invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyRequest {
    ProtectivePut {
        asset: Asset,
        spot_qty: f64,
        strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    },
    CoveredCall {
        asset: Asset,
        spot_qty: f64,
        strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    },
    Collar {
        asset: Asset,
        spot_qty: f64,
        put_strike: f64,
        call_strike: f64,
        days: f64,
        volatility: f64,
        spot_price: f64,
    },
    DeltaNeutral {
        asset: Asset,
        /// Venue of the perpetual leg; names the hedge instrument
        #[serde(default)]
        exchange: ExchangeId,
        spot_qty: f64,
        perp_qty: f64,
        threshold_percent: f64,
    },
}

/// Loosely typed parameters as they arrive from the command layer
///
/// Only the fields the selected strategy needs have to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub asset: Asset,
    pub spot_qty: f64,
    pub perp_qty: f64,
    /// Strike for single-leg strategies
    pub strike: Option<f64>,
    pub put_strike: Option<f64>,
    pub call_strike: Option<f64>,
    pub days: Option<f64>,
    pub volatility: Option<f64>,
    pub spot_price: Option<f64>,
    pub threshold_percent: Option<f64>,
    /// Perpetual venue for delta-neutral hedges, Deribit when unset
    pub exchange: Option<ExchangeId>,
}

impl StrategyParams {
    pub fn new(asset: impl Into<Asset>, spot_qty: f64) -> Self {
        Self {
            asset: asset.into(),
            spot_qty,
            ..Default::default()
        }
    }
}

fn required(value: Option<f64>, name: &str, kind: StrategyKind) -> Result<f64> {
    value.ok_or_else(|| Error::invalid(format!("{kind} requires `{name}`")))
}

impl StrategyRequest {
    /// Resolve a strategy name and its parameters into a request
    pub fn from_name(name: &str, params: &StrategyParams) -> Result<Self> {
        let kind: StrategyKind = name.parse()?;
        Self::build(kind, params)
    }

    pub fn build(kind: StrategyKind, p: &StrategyParams) -> Result<Self> {
        if p.asset.trim().is_empty() {
            return Err(Error::invalid("asset must not be empty"));
        }
        let asset = p.asset.clone();

        let request = match kind {
            StrategyKind::ProtectivePut => StrategyRequest::ProtectivePut {
                asset,
                spot_qty: p.spot_qty,
                strike: required(p.strike, "strike", kind)?,
                days: required(p.days, "days", kind)?,
                volatility: required(p.volatility, "volatility", kind)?,
                spot_price: required(p.spot_price, "spot_price", kind)?,
            },
            StrategyKind::CoveredCall => StrategyRequest::CoveredCall {
                asset,
                spot_qty: p.spot_qty,
                strike: required(p.strike, "strike", kind)?,
                days: required(p.days, "days", kind)?,
                volatility: required(p.volatility, "volatility", kind)?,
                spot_price: required(p.spot_price, "spot_price", kind)?,
            },
            StrategyKind::Collar => StrategyRequest::Collar {
                asset,
                spot_qty: p.spot_qty,
                put_strike: required(p.put_strike, "put_strike", kind)?,
                call_strike: required(p.call_strike, "call_strike", kind)?,
                days: required(p.days, "days", kind)?,
                volatility: required(p.volatility, "volatility", kind)?,
                spot_price: required(p.spot_price, "spot_price", kind)?,
            },
            StrategyKind::DeltaNeutral => StrategyRequest::DeltaNeutral {
                asset,
                exchange: p.exchange.unwrap_or_default(),
                spot_qty: p.spot_qty,
                perp_qty: p.perp_qty,
                threshold_percent: required(p.threshold_percent, "threshold_percent", kind)?,
            },
        };
        Ok(request)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyRequest::ProtectivePut { .. } => StrategyKind::ProtectivePut,
            StrategyRequest::CoveredCall { .. } => StrategyKind::CoveredCall,
            StrategyRequest::Collar { .. } => StrategyKind::Collar,
            StrategyRequest::DeltaNeutral { .. } => StrategyKind::DeltaNeutral,
        }
    }

    pub fn asset(&self) -> &str {
        match self {
            StrategyRequest::ProtectivePut { asset, .. }
            | StrategyRequest::CoveredCall { asset, .. }
            | StrategyRequest::Collar { asset, .. }
            | StrategyRequest::DeltaNeutral { asset, .. } => asset,
        }
    }
}
