use aegis_core::{Error, ExchangeId, Position, PriceSeries, Result};
use aegis_ports::MarketDataSource;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;

/// Exchange-priority fallback over one market data source
///
/// Each fetch tries the given exchanges in order and returns the first
/// success. A non-retryable error (a bad request rather than a bad venue)
/// ends the walk at once. When every exchange fails the error lists each
/// exchange's reason.
#[derive(Clone)]
pub struct PriorityMarketData {
    source: Arc<dyn MarketDataSource>,
}

impl PriorityMarketData {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn MarketDataSource> {
        &self.source
    }

    async fn first_success<T, F, Fut>(
        &self,
        asset: &str,
        exchanges: &[ExchangeId],
        what: &str,
        fetch: F,
    ) -> Result<(ExchangeId, T)>
    where
        F: Fn(ExchangeId) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if exchanges.is_empty() {
            return Err(Error::unavailable(asset, "no exchanges configured"));
        }

        let mut reasons = Vec::with_capacity(exchanges.len());
        for &exchange in exchanges {
            match fetch(exchange).await {
                Ok(value) => {
                    if !reasons.is_empty() {
                        debug!("[MARKET] {asset} {what} served by {exchange} after fallback");
                    }
                    return Ok((exchange, value));
                }
                Err(e) if !e.is_retryable() => {
                    warn!("[MARKET] {asset} {what} rejected by {exchange}: {e}");
                    return Err(e);
                }
                Err(e) => {
                    warn!("[MARKET] {asset} {what} failed on {exchange}: {e}");
                    let reason = match e {
                        Error::DataUnavailable { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    reasons.push(format!("{exchange}: {reason}"));
                }
            }
        }

        Err(Error::unavailable(asset, reasons.join("; ")))
    }

    pub async fn fetch_position(&self, asset: &str, exchanges: &[ExchangeId]) -> Result<Position> {
        let (_, position) = self
            .first_success(asset, exchanges, "position", |ex| self.source.fetch_position(asset, ex))
            .await?;
        Ok(position)
    }

    pub async fn fetch_price_series(
        &self,
        asset: &str,
        exchanges: &[ExchangeId],
        lookback_days: u32,
    ) -> Result<PriceSeries> {
        let (_, series) = self
            .first_success(asset, exchanges, "price series", |ex| {
                self.source.fetch_price_series(asset, ex, lookback_days)
            })
            .await?;
        Ok(series)
    }

    /// Spot price and the exchange that supplied it
    pub async fn fetch_spot_price(
        &self,
        asset: &str,
        exchanges: &[ExchangeId],
    ) -> Result<(ExchangeId, f64)> {
        self.first_success(asset, exchanges, "spot price", |ex| {
            self.source.fetch_spot_price(asset, ex)
        })
        .await
    }

    pub async fn fetch_perp_price(
        &self,
        asset: &str,
        exchanges: &[ExchangeId],
    ) -> Result<(ExchangeId, f64)> {
        self.first_success(asset, exchanges, "perp price", |ex| {
            self.source.fetch_perp_price(asset, ex)
        })
        .await
    }

    pub async fn fetch_option_market(&self, asset: &str, expiry_days: u32) -> Result<f64> {
        self.source.fetch_option_market(asset, expiry_days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::InMemoryMarketData;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rejects every request as malformed and counts the attempts
    #[derive(Default)]
    struct RejectingSource {
        calls: AtomicUsize,
    }

    impl RejectingSource {
        fn reject<T>(&self) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::invalid("unknown instrument"))
        }
    }

    #[async_trait]
    impl MarketDataSource for RejectingSource {
        async fn fetch_price_series(&self, _: &str, _: ExchangeId, _: u32) -> Result<PriceSeries> {
            self.reject()
        }

        async fn fetch_position(&self, _: &str, _: ExchangeId) -> Result<Position> {
            self.reject()
        }

        async fn fetch_option_market(&self, _: &str, _: u32) -> Result<f64> {
            self.reject()
        }

        async fn fetch_spot_price(&self, _: &str, _: ExchangeId) -> Result<f64> {
            self.reject()
        }

        async fn fetch_perp_price(&self, _: &str, _: ExchangeId) -> Result<f64> {
            self.reject()
        }

        async fn fetch_instrument_price(&self, _: &str) -> Result<f64> {
            self.reject()
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_skips_fallback() {
        let source = Arc::new(RejectingSource::default());
        let priority = PriorityMarketData::new(source.clone());

        let err = priority
            .fetch_perp_price("BTC", &ExchangeId::PRIORITY)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_exchange() {
        let market = Arc::new(InMemoryMarketData::new());
        market.set_spot_price("BTC", 100_000.0);
        market.fail_exchange(ExchangeId::Deribit, "maintenance");

        let priority = PriorityMarketData::new(market);
        let (exchange, price) = priority
            .fetch_spot_price("BTC", &ExchangeId::PRIORITY)
            .await
            .unwrap();
        assert_eq!(exchange, ExchangeId::Okx);
        assert_eq!(price, 100_000.0);
    }

    #[tokio::test]
    async fn test_all_exchanges_fail() {
        let market = Arc::new(InMemoryMarketData::new());
        market.set_position("BTC", 1.0, 0.0);
        market.fail_exchange(ExchangeId::Deribit, "maintenance");
        market.fail_exchange(ExchangeId::Okx, "rate limited");

        let priority = PriorityMarketData::new(market);
        let err = priority
            .fetch_position("BTC", &[ExchangeId::Deribit, ExchangeId::Okx])
            .await
            .unwrap_err();

        match err {
            Error::DataUnavailable { asset, reason } => {
                assert_eq!(asset, "BTC");
                assert!(reason.contains("deribit: maintenance"));
                assert!(reason.contains("okx: rate limited"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_exchanges() {
        let priority = PriorityMarketData::new(Arc::new(InMemoryMarketData::new()));
        assert!(matches!(
            priority.fetch_position("BTC", &[]).await,
            Err(Error::DataUnavailable { .. })
        ));
    }
}
