use aegis_core::{ExchangeId, Position, PriceSeries, Result};
use async_trait::async_trait;

/// Port for market and account data
///
/// Implemented by exchange adapters. Every method fails with
/// `Error::DataUnavailable`; retry/backoff is the implementation's concern,
/// the calculation layer never retries.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Historical prices covering the last `lookback_days`, oldest first
    async fn fetch_price_series(
        &self,
        asset: &str,
        exchange: ExchangeId,
        lookback_days: u32,
    ) -> Result<PriceSeries>;

    /// Current spot and perpetual holdings
    async fn fetch_position(&self, asset: &str, exchange: ExchangeId) -> Result<Position>;

    /// Implied volatility (annualised, e.g. 0.6) for the given expiry
    async fn fetch_option_market(&self, asset: &str, expiry_days: u32) -> Result<f64>;

    async fn fetch_spot_price(&self, asset: &str, exchange: ExchangeId) -> Result<f64>;

    async fn fetch_perp_price(&self, asset: &str, exchange: ExchangeId) -> Result<f64>;

    /// Last traded price of any named instrument (used to mark option legs)
    async fn fetch_instrument_price(&self, instrument: &str) -> Result<f64>;

    /// Source name for logging
    fn name(&self) -> &str {
        "MarketDataSource"
    }
}
