use serde::{Deserialize, Serialize};

use crate::values::{Asset, Timestamp};

/// Point-in-time risk evaluation for one asset
///
/// Derived and ephemeral: recomputed every monitoring tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub asset: Asset,
    pub net_delta: f64,
    /// Always >= 0
    pub threshold_limit: f64,
    pub needs_hedge: bool,
    pub timestamp: Timestamp,
}
