use aegis_core::{Asset, Error, ExchangeId, OptionType, Position, PricePoint, PriceSeries, Result};
use aegis_options::BlackScholes;
use aegis_ports::MarketDataSource;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Starting state of one simulated asset
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedAsset {
    pub asset: Asset,
    pub initial_price: f64,
    /// Annualised volatility, also reported as implied vol
    pub volatility: f64,
    pub spot_size: f64,
    pub perp_size: f64,
}

impl SimulatedAsset {
    pub fn new(asset: impl Into<Asset>, initial_price: f64, volatility: f64, spot_size: f64, perp_size: f64) -> Self {
        Self {
            asset: asset.into(),
            initial_price,
            volatility,
            spot_size,
            perp_size,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            SimulatedAsset::new("BTC", 100_000.0, 0.6, 2.0, -1.5),
            SimulatedAsset::new("ETH", 3_000.0, 0.75, 10.0, -9.5),
        ]
    }
}

#[derive(Debug)]
struct AssetState {
    price: f64,
    volatility: f64,
    spot_size: f64,
    perp_size: f64,
}

/// Seeded random-walk market
///
/// Every spot fetch advances the asset's price by one step; perpetual
/// positions drift so threshold breaches come and go. All exchanges see the
/// same book.
pub struct SimulatedMarketData {
    assets: Mutex<HashMap<Asset, AssetState>>,
    rng: Mutex<StdRng>,
    /// Fractional price move per step (e.g. 0.002 = 0.2%)
    step_volatility: f64,
    /// Perpetual premium over spot
    basis: f64,
}

impl SimulatedMarketData {
    pub fn new(assets: Vec<SimulatedAsset>) -> Self {
        Self::with_rng(assets, StdRng::from_entropy())
    }

    /// Reproducible simulation
    pub fn with_seed(assets: Vec<SimulatedAsset>, seed: u64) -> Self {
        Self::with_rng(assets, StdRng::seed_from_u64(seed))
    }

    fn with_rng(assets: Vec<SimulatedAsset>, rng: StdRng) -> Self {
        let assets = assets
            .into_iter()
            .map(|a| {
                (
                    a.asset,
                    AssetState {
                        price: a.initial_price,
                        volatility: a.volatility,
                        spot_size: a.spot_size,
                        perp_size: a.perp_size,
                    },
                )
            })
            .collect();

        Self {
            assets: Mutex::new(assets),
            rng: Mutex::new(rng),
            step_volatility: 0.002,
            basis: 0.0005,
        }
    }

    /// Uniform draw scaled to unit variance
    fn shock(&self) -> f64 {
        self.rng.lock().gen_range(-1.0..1.0) * 3.0_f64.sqrt()
    }

    fn with_asset<T>(&self, asset: &str, f: impl FnOnce(&mut AssetState) -> T) -> Result<T> {
        let mut assets = self.assets.lock();
        let state = assets
            .get_mut(asset)
            .ok_or_else(|| Error::unavailable(asset, "unknown asset"))?;
        Ok(f(state))
    }

    fn step(&self, asset: &str) -> Result<f64> {
        let shock = self.shock();
        let step = self.step_volatility;
        self.with_asset(asset, |s| {
            s.price *= 1.0 + step * shock;
            s.price
        })
    }

    fn current(&self, asset: &str) -> Result<(f64, f64)> {
        self.with_asset(asset, |s| (s.price, s.volatility))
    }
}

/// Parse `ASSET-DMMMYY-STRIKE-P|C`
fn parse_option(instrument: &str) -> Option<(Asset, NaiveDate, f64, OptionType)> {
    let mut parts = instrument.split('-');
    let asset = parts.next()?.to_string();
    let expiry = NaiveDate::parse_from_str(parts.next()?, "%d%b%y").ok()?;
    let strike = parts.next()?.parse().ok()?;
    let option_type = match parts.next()? {
        "P" => OptionType::Put,
        "C" => OptionType::Call,
        _ => return None,
    };
    parts.next().is_none().then_some((asset, expiry, strike, option_type))
}

#[async_trait]
impl MarketDataSource for SimulatedMarketData {
    async fn fetch_price_series(
        &self,
        asset: &str,
        _exchange: ExchangeId,
        lookback_days: u32,
    ) -> Result<PriceSeries> {
        let (last, volatility) = self.current(asset)?;
        let daily = volatility / 365.0_f64.sqrt();
        let now = Utc::now();

        let mut prices = Vec::with_capacity(lookback_days as usize + 1);
        let mut price = last;
        prices.push(price);
        for _ in 0..lookback_days {
            price /= (1.0 + daily * self.shock()).max(0.01);
            prices.push(price);
        }
        prices.reverse();

        let points = prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                timestamp: now - Duration::days(i64::from(lookback_days) - i as i64),
                price,
            })
            .collect();
        Ok(PriceSeries::new(asset, points))
    }

    async fn fetch_position(&self, asset: &str, exchange: ExchangeId) -> Result<Position> {
        let drift = self.shock() * 0.01;
        let (spot, perp) = self.with_asset(asset, |s| {
            s.perp_size += drift * s.spot_size.abs();
            (s.spot_size, s.perp_size)
        })?;
        Ok(Position::new(asset, exchange, spot, perp))
    }

    async fn fetch_option_market(&self, asset: &str, _expiry_days: u32) -> Result<f64> {
        self.current(asset).map(|(_, volatility)| volatility)
    }

    async fn fetch_spot_price(&self, asset: &str, _exchange: ExchangeId) -> Result<f64> {
        self.step(asset)
    }

    async fn fetch_perp_price(&self, asset: &str, _exchange: ExchangeId) -> Result<f64> {
        let (price, _) = self.current(asset)?;
        Ok(price * (1.0 + self.basis))
    }

    /// Black-Scholes mark at the current simulated price
    async fn fetch_instrument_price(&self, instrument: &str) -> Result<f64> {
        let (asset, expiry, strike, option_type) = parse_option(instrument)
            .ok_or_else(|| Error::unavailable(instrument, "unrecognised instrument"))?;
        let (spot, volatility) = self.current(&asset)?;

        let expiry = expiry.and_hms_opt(8, 0, 0).map(|t| t.and_utc());
        let days = expiry
            .map(|t| (t - Utc::now()).num_seconds() as f64 / 86_400.0)
            .unwrap_or(0.0);
        if days <= 0.0 {
            let intrinsic = match option_type {
                OptionType::Call => (spot - strike).max(0.0),
                OptionType::Put => (strike - spot).max(0.0),
            };
            return Ok(intrinsic);
        }

        Ok(BlackScholes::new(spot, strike, days, 0.0, volatility)?.price(option_type))
    }

    fn name(&self) -> &str {
        "SimulatedMarketData"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option() {
        let (asset, expiry, strike, kind) = parse_option("BTC-19NOV26-90000-P").unwrap();
        assert_eq!(asset, "BTC");
        assert_eq!(expiry, NaiveDate::from_ymd_opt(2026, 11, 19).unwrap());
        assert_eq!(strike, 90000.0);
        assert_eq!(kind, OptionType::Put);

        assert!(parse_option("BTC-PERPETUAL").is_none());
        assert!(parse_option("BTC-19NOV26-90000-X").is_none());
    }

    #[tokio::test]
    async fn test_seeded_walks_repeat() {
        let a = SimulatedMarketData::with_seed(SimulatedAsset::defaults(), 7);
        let b = SimulatedMarketData::with_seed(SimulatedAsset::defaults(), 7);

        for _ in 0..5 {
            let pa = a.fetch_spot_price("BTC", ExchangeId::Deribit).await.unwrap();
            let pb = b.fetch_spot_price("BTC", ExchangeId::Okx).await.unwrap();
            assert_eq!(pa, pb);
            assert!(pa > 0.0);
        }
    }

    #[tokio::test]
    async fn test_history_ends_at_current_price() {
        let market = SimulatedMarketData::with_seed(SimulatedAsset::defaults(), 1);
        let spot = market.fetch_spot_price("ETH", ExchangeId::Deribit).await.unwrap();
        let series = market
            .fetch_price_series("ETH", ExchangeId::Deribit, 30)
            .await
            .unwrap();

        assert_eq!(series.len(), 31);
        assert_eq!(series.last_price(), Some(spot));
        assert!(series.prices().iter().all(|p| *p > 0.0));
    }

    #[tokio::test]
    async fn test_unknown_asset() {
        let market = SimulatedMarketData::with_seed(SimulatedAsset::defaults(), 1);
        assert!(matches!(
            market.fetch_position("DOGE", ExchangeId::Bybit).await,
            Err(Error::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_option_marks() {
        let market = SimulatedMarketData::with_seed(SimulatedAsset::defaults(), 1);
        let expiry = (Utc::now() + Duration::days(30)).format("%-d%b%y").to_string().to_uppercase();

        let put = market
            .fetch_instrument_price(&format!("BTC-{expiry}-90000-P"))
            .await
            .unwrap();
        assert!(put > 0.0 && put < 90_000.0);

        // Expired: intrinsic only
        let expired = market.fetch_instrument_price("BTC-1JAN20-200000-P").await.unwrap();
        assert_eq!(expired, 200_000.0 - 100_000.0);
    }
}
