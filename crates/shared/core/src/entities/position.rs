use serde::{Deserialize, Serialize};

use crate::instruments::ExchangeId;
use crate::values::Asset;

/// Combined spot and perpetual exposure for one asset on one exchange
///
/// Sizes are signed: positive = long, negative = short. A zero size is a
/// valid terminal state; positions are never removed implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Asset ticker
    pub asset: Asset,
    /// Exchange holding the position
    pub exchange: ExchangeId,
    /// Spot holding (signed)
    pub spot_size: f64,
    /// Perpetual futures holding (signed)
    pub perp_size: f64,
}

impl Position {
    pub fn new(asset: impl Into<Asset>, exchange: ExchangeId, spot_size: f64, perp_size: f64) -> Self {
        Self {
            asset: asset.into(),
            exchange,
            spot_size,
            perp_size,
        }
    }
}
