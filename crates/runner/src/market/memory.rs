use aegis_core::{Asset, Error, ExchangeId, Position, PricePoint, PriceSeries, Result};
use aegis_ports::MarketDataSource;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;

/// Scripted market data for tests and dry runs
///
/// Prices and positions are set explicitly. Failures can be injected per
/// asset or per exchange; an injected failure wins over stored data.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    positions: DashMap<Asset, (f64, f64)>,
    series: DashMap<Asset, Vec<f64>>,
    spot: DashMap<Asset, f64>,
    perp: DashMap<Asset, f64>,
    volatility: DashMap<Asset, f64>,
    marks: DashMap<String, f64>,
    failing_assets: DashMap<Asset, String>,
    failing_exchanges: DashMap<ExchangeId, String>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, asset: &str, spot_size: f64, perp_size: f64) {
        self.positions.insert(asset.to_string(), (spot_size, perp_size));
    }

    /// Daily closes, oldest first
    pub fn set_prices(&self, asset: &str, prices: Vec<f64>) {
        self.series.insert(asset.to_string(), prices);
    }

    pub fn set_spot_price(&self, asset: &str, price: f64) {
        self.spot.insert(asset.to_string(), price);
    }

    pub fn set_perp_price(&self, asset: &str, price: f64) {
        self.perp.insert(asset.to_string(), price);
    }

    pub fn set_volatility(&self, asset: &str, volatility: f64) {
        self.volatility.insert(asset.to_string(), volatility);
    }

    pub fn set_mark(&self, instrument: &str, price: f64) {
        self.marks.insert(instrument.to_string(), price);
    }

    /// Every fetch for `asset` fails until `recover_asset`
    pub fn fail_asset(&self, asset: &str, reason: &str) {
        self.failing_assets.insert(asset.to_string(), reason.to_string());
    }

    pub fn recover_asset(&self, asset: &str) {
        self.failing_assets.remove(asset);
    }

    /// Every exchange-specific fetch against `exchange` fails
    pub fn fail_exchange(&self, exchange: ExchangeId, reason: &str) {
        self.failing_exchanges.insert(exchange, reason.to_string());
    }

    fn check(&self, asset: &str, exchange: Option<ExchangeId>) -> Result<()> {
        if let Some(reason) = self.failing_assets.get(asset) {
            return Err(Error::unavailable(asset, reason.value().clone()));
        }
        if let Some(reason) = exchange.and_then(|ex| self.failing_exchanges.get(&ex)) {
            return Err(Error::unavailable(asset, reason.value().clone()));
        }
        Ok(())
    }

    fn lookup(map: &DashMap<Asset, f64>, asset: &str, what: &str) -> Result<f64> {
        map.get(asset)
            .map(|v| *v.value())
            .ok_or_else(|| Error::unavailable(asset, format!("no {what}")))
    }
}

#[async_trait]
impl MarketDataSource for InMemoryMarketData {
    async fn fetch_price_series(
        &self,
        asset: &str,
        exchange: ExchangeId,
        lookback_days: u32,
    ) -> Result<PriceSeries> {
        self.check(asset, Some(exchange))?;
        let prices = self
            .series
            .get(asset)
            .map(|s| s.value().clone())
            .ok_or_else(|| Error::unavailable(asset, "no price history"))?;

        let keep = (lookback_days as usize + 1).min(prices.len());
        let recent = &prices[prices.len() - keep..];
        let end = Utc::now();
        let points = recent
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp: end - Duration::days((keep - 1 - i) as i64),
                price,
            })
            .collect();
        Ok(PriceSeries::new(asset, points))
    }

    async fn fetch_position(&self, asset: &str, exchange: ExchangeId) -> Result<Position> {
        self.check(asset, Some(exchange))?;
        let (spot, perp) = self
            .positions
            .get(asset)
            .map(|p| *p.value())
            .ok_or_else(|| Error::unavailable(asset, "no position"))?;
        Ok(Position::new(asset, exchange, spot, perp))
    }

    async fn fetch_option_market(&self, asset: &str, _expiry_days: u32) -> Result<f64> {
        self.check(asset, None)?;
        Self::lookup(&self.volatility, asset, "implied volatility")
    }

    async fn fetch_spot_price(&self, asset: &str, exchange: ExchangeId) -> Result<f64> {
        self.check(asset, Some(exchange))?;
        Self::lookup(&self.spot, asset, "spot price")
    }

    async fn fetch_perp_price(&self, asset: &str, exchange: ExchangeId) -> Result<f64> {
        self.check(asset, Some(exchange))?;
        Self::lookup(&self.perp, asset, "perp price")
    }

    async fn fetch_instrument_price(&self, instrument: &str) -> Result<f64> {
        let underlying = instrument.split('-').next().unwrap_or(instrument);
        self.check(underlying, None)?;
        self.marks
            .get(instrument)
            .map(|v| *v.value())
            .ok_or_else(|| Error::unavailable(underlying, format!("no mark for {instrument}")))
    }

    fn name(&self) -> &str {
        "InMemoryMarketData"
    }
}
