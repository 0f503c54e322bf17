use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Instrument family traded on an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Spot,
    Perpetual,
}

/// Supported exchanges, in default priority order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    #[default]
    Deribit,
    Okx,
    Bybit,
}

impl ExchangeId {
    /// Default fallback order when an asset has no explicit preference
    pub const PRIORITY: [ExchangeId; 3] = [ExchangeId::Deribit, ExchangeId::Okx, ExchangeId::Bybit];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Deribit => "deribit",
            ExchangeId::Okx => "okx",
            ExchangeId::Bybit => "bybit",
        }
    }

    /// Exchange-native symbol for an asset
    ///
    /// Deribit has no spot book for most assets, so the perpetual doubles
    /// as the spot proxy there.
    pub fn symbol(&self, asset: &str, kind: InstrumentKind) -> String {
        let asset = asset.to_ascii_uppercase();
        match (self, kind) {
            (ExchangeId::Deribit, _) => format!("{asset}-PERPETUAL"),
            (ExchangeId::Okx, InstrumentKind::Perpetual) => format!("{asset}-USDT-SWAP"),
            (ExchangeId::Bybit, InstrumentKind::Perpetual) => format!("{asset}USDT"),
            (ExchangeId::Okx | ExchangeId::Bybit, InstrumentKind::Spot) => format!("{asset}/USDT"),
        }
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deribit" => Ok(ExchangeId::Deribit),
            "okx" => Ok(ExchangeId::Okx),
            "bybit" => Ok(ExchangeId::Bybit),
            other => Err(Error::invalid(format!("unknown exchange '{other}'"))),
        }
    }
}
