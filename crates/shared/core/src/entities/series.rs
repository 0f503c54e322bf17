use serde::{Deserialize, Serialize};

use crate::values::{Asset, Timestamp};

/// A single observation in a price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: Timestamp,
    pub price: f64,
}

/// Ordered (timestamp, price) history for one asset
///
/// Immutable once fetched; supplied fresh for every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub asset: Asset,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, ordering points by timestamp
    pub fn new(asset: impl Into<Asset>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            asset: asset.into(),
            points,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Prices in time order
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
