use aegis_core::{Asset, Greeks, HedgeResult, RiskSnapshot};
use dashmap::DashMap;
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Mark-to-market of one held option leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegAttribution {
    pub instrument: String,
    /// Signed size
    pub size: f64,
    /// Premium per unit at entry
    pub entry: f64,
    /// Current price per unit (entry premium when no mark was available)
    pub mark: f64,
    /// `size * (mark - entry)`
    pub pnl: f64,
}

/// Aggregate view of one asset's hedges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub asset: Asset,
    pub greeks: Greeks,
    /// Sum of negative hedge costs, reported positive
    pub premium_received: f64,
    /// Sum of positive hedge costs
    pub premium_paid: f64,
    /// `sum(size * mark)` over held option legs
    pub mark_to_market: f64,
    /// `premium_received - premium_paid + mark_to_market`
    pub net_pnl: f64,
    pub legs: Vec<LegAttribution>,
    /// Instruments valued at entry premium for lack of a mark
    pub stale_marks: Vec<String>,
}

#[derive(Debug, Default)]
struct AssetBook {
    last_snapshot: Option<RiskSnapshot>,
    history: Vec<HedgeResult>,
    greeks: Greeks,
}

/// Per-asset hedge books
#[derive(Debug, Default)]
pub struct PortfolioAnalytics {
    books: DashMap<Asset, Arc<Mutex<AssetBook>>>,
}

impl PortfolioAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, asset: &str) -> Arc<Mutex<AssetBook>> {
        if let Some(book) = self.books.get(asset) {
            return Arc::clone(book.value());
        }
        Arc::clone(self.books.entry(asset.to_string()).or_default().value())
    }

    fn existing(&self, asset: &str) -> Option<Arc<Mutex<AssetBook>>> {
        self.books.get(asset).map(|book| Arc::clone(book.value()))
    }

    /// Append a hedge to its asset's history and add its exposure
    pub fn record(&self, result: HedgeResult) {
        let book = self.book(&result.asset);
        let mut book = book.lock();
        book.greeks += result.exposure();
        info!(
            "[PORTFOLIO] {} recorded {} {} size {:.4} cost {:.4} ({} hedges)",
            result.asset,
            result.strategy,
            result.instrument,
            result.size,
            result.cost,
            book.history.len() + 1
        );
        book.history.push(result);
    }

    pub fn update_snapshot(&self, snapshot: RiskSnapshot) {
        let book = self.book(&snapshot.asset);
        book.lock().last_snapshot = Some(snapshot);
    }

    pub fn last_snapshot(&self, asset: &str) -> Option<RiskSnapshot> {
        self.existing(asset)?.lock().last_snapshot.clone()
    }

    /// Last `n` hedges, most recent first
    pub fn history(&self, asset: &str, n: usize) -> Vec<HedgeResult> {
        match self.existing(asset) {
            Some(book) => book.lock().history.iter().rev().take(n).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn last_hedge(&self, asset: &str) -> Option<HedgeResult> {
        self.existing(asset)?.lock().history.last().cloned()
    }

    /// Running aggregate Greeks for one asset
    pub fn greeks(&self, asset: &str) -> Greeks {
        self.existing(asset)
            .map(|book| book.lock().greeks)
            .unwrap_or_default()
    }

    /// Sum of every asset's aggregate Greeks
    pub fn total_greeks(&self) -> Greeks {
        self.books
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|book| book.lock().greeks)
            .sum()
    }

    /// Assets with a book, sorted
    pub fn assets(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self.books.iter().map(|e| e.key().clone()).collect();
        assets.sort();
        assets
    }

    /// Option instruments held for an asset, in recording order, deduplicated
    pub fn open_instruments(&self, asset: &str) -> Vec<String> {
        let Some(book) = self.existing(asset) else {
            return Vec::new();
        };
        let book = book.lock();
        let mut instruments: Vec<String> = Vec::new();
        for leg in book.history.iter().flat_map(|h| h.legs.iter()) {
            if !instruments.contains(&leg.instrument) {
                instruments.push(leg.instrument.clone());
            }
        }
        instruments
    }

    /// Aggregate Greeks and P&L estimate for an asset
    ///
    /// `marks` maps option instrument to its current price per unit. Legs
    /// without a mark are valued at their entry premium and listed in
    /// `stale_marks`. Read-only.
    pub fn snapshot(&self, asset: &str, marks: &HashMap<String, f64>) -> PortfolioSnapshot {
        let (greeks, history) = match self.existing(asset) {
            Some(book) => {
                let book = book.lock();
                (book.greeks, book.history.clone())
            }
            None => (Greeks::default(), Vec::new()),
        };

        let mut premium_received = 0.0;
        let mut premium_paid = 0.0;
        let mut mark_to_market = 0.0;
        let mut legs = Vec::new();
        let mut stale_marks = Vec::new();

        for hedge in &history {
            if hedge.cost < 0.0 {
                premium_received += -hedge.cost;
            } else {
                premium_paid += hedge.cost;
            }

            for leg in &hedge.legs {
                let mark = match marks.get(&leg.instrument) {
                    Some(mark) => *mark,
                    None => {
                        if !stale_marks.contains(&leg.instrument) {
                            stale_marks.push(leg.instrument.clone());
                        }
                        leg.premium
                    }
                };
                mark_to_market += leg.size * mark;
                legs.push(LegAttribution {
                    instrument: leg.instrument.clone(),
                    size: leg.size,
                    entry: leg.premium,
                    mark,
                    pnl: leg.size * (mark - leg.premium),
                });
            }
        }

        if !stale_marks.is_empty() {
            debug!("[PORTFOLIO] {asset}: no mark for {}", stale_marks.join(", "));
        }

        PortfolioSnapshot {
            asset: asset.to_string(),
            greeks,
            premium_received,
            premium_paid,
            mark_to_market,
            net_pnl: premium_received - premium_paid + mark_to_market,
            legs,
            stale_marks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{OptionLeg, OptionType, StrategyKind};
    use approx::assert_relative_eq;
    use chrono::{Duration, Utc};

    fn perp_hedge(asset: &str, size: f64) -> HedgeResult {
        HedgeResult {
            strategy: StrategyKind::DeltaNeutral,
            asset: asset.to_string(),
            instrument: format!("{asset}-PERPETUAL"),
            size,
            cost: 0.0,
            greeks: None,
            legs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    fn leg(instrument: &str, option_type: OptionType, size: f64, premium: f64, greeks: Greeks) -> OptionLeg {
        OptionLeg {
            instrument: instrument.to_string(),
            option_type,
            strike: 90_000.0,
            days_to_expiry: 30.0,
            volatility: 0.6,
            size,
            premium,
            cost: size * premium,
            greeks: greeks.scaled(size),
        }
    }

    fn collar_hedge() -> HedgeResult {
        let put = leg("BTC-19NOV26-90000-P", OptionType::Put, 2.0, 1500.0, Greeks::new(-0.2, 1e-5, -40.0, 80.0));
        let call = leg("BTC-19NOV26-110000-C", OptionType::Call, -2.0, 1000.0, Greeks::new(0.25, 1e-5, -45.0, 85.0));
        let greeks = put.greeks + call.greeks;
        HedgeResult {
            strategy: StrategyKind::Collar,
            asset: "BTC".to_string(),
            instrument: format!("{}/{}", put.instrument, call.instrument),
            size: 2.0,
            cost: put.cost + call.cost,
            greeks: Some(greeks),
            legs: vec![put, call],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_history_most_recent_first() {
        let portfolio = PortfolioAnalytics::new();
        for size in [1.0, 2.0, 3.0] {
            portfolio.record(perp_hedge("BTC", size));
        }

        let history = portfolio.history("BTC", 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].size, 3.0);
        assert_eq!(history[1].size, 2.0);
        assert_eq!(portfolio.history("BTC", 10).len(), 3);
        assert!(portfolio.history("ETH", 5).is_empty());
        assert_eq!(portfolio.last_hedge("BTC").unwrap().size, 3.0);
        assert!(portfolio.last_hedge("ETH").is_none());
    }

    #[test]
    fn test_aggregate_greeks_are_additive() {
        let portfolio = PortfolioAnalytics::new();
        let collar = collar_hedge();
        let collar_greeks = collar.greeks.unwrap();
        portfolio.record(collar);
        portfolio.record(perp_hedge("BTC", -1.5));
        portfolio.record(perp_hedge("ETH", 4.0));

        let btc = portfolio.greeks("BTC");
        assert_relative_eq!(btc.delta, collar_greeks.delta - 1.5);
        assert_relative_eq!(btc.vega, collar_greeks.vega);

        let total = portfolio.total_greeks();
        assert_relative_eq!(total.delta, btc.delta + 4.0);
        assert_relative_eq!(total.gamma, btc.gamma);
        assert_eq!(portfolio.assets(), vec!["BTC".to_string(), "ETH".to_string()]);
    }

    #[test]
    fn test_snapshot_pnl() {
        let portfolio = PortfolioAnalytics::new();
        portfolio.record(collar_hedge());

        let mut marks = HashMap::new();
        marks.insert("BTC-19NOV26-90000-P".to_string(), 1200.0);
        marks.insert("BTC-19NOV26-110000-C".to_string(), 1100.0);
        let snap = portfolio.snapshot("BTC", &marks);

        // Net cost 2*1500 - 2*1000 = 1000 paid
        assert_eq!(snap.premium_paid, 1000.0);
        assert_eq!(snap.premium_received, 0.0);
        assert_eq!(snap.mark_to_market, 2.0 * 1200.0 - 2.0 * 1100.0);
        assert_eq!(snap.net_pnl, -1000.0 + 200.0);

        let leg_pnl: f64 = snap.legs.iter().map(|l| l.pnl).sum();
        assert_relative_eq!(leg_pnl, snap.net_pnl);
        assert_eq!(snap.legs[0].pnl, 2.0 * (1200.0 - 1500.0));
        assert!(snap.stale_marks.is_empty());
    }

    #[test]
    fn test_snapshot_without_marks_is_flat_and_stale() {
        let portfolio = PortfolioAnalytics::new();
        portfolio.record(collar_hedge());

        let snap = portfolio.snapshot("BTC", &HashMap::new());
        assert_eq!(snap.net_pnl, 0.0);
        assert_eq!(snap.stale_marks.len(), 2);
        assert_eq!(portfolio.open_instruments("BTC"), snap.stale_marks);
    }

    #[test]
    fn test_last_snapshot() {
        let portfolio = PortfolioAnalytics::new();
        assert!(portfolio.last_snapshot("BTC").is_none());

        let now = Utc::now();
        for offset in [0, 60] {
            portfolio.update_snapshot(RiskSnapshot {
                asset: "BTC".to_string(),
                net_delta: offset as f64,
                threshold_limit: 1.0,
                needs_hedge: offset > 0,
                timestamp: now + Duration::seconds(offset),
            });
        }
        let last = portfolio.last_snapshot("BTC").unwrap();
        assert_eq!(last.net_delta, 60.0);
        assert!(last.needs_hedge);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends() {
        let portfolio = Arc::new(PortfolioAnalytics::new());
        let mut handles = Vec::new();

        for task in 0..8 {
            let portfolio = Arc::clone(&portfolio);
            handles.push(tokio::spawn(async move {
                let asset = if task % 2 == 0 { "BTC" } else { "ETH" };
                for _ in 0..100 {
                    portfolio.record(perp_hedge(asset, 1.0));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(portfolio.history("BTC", usize::MAX).len(), 400);
        assert_eq!(portfolio.history("ETH", usize::MAX).len(), 400);
        assert_eq!(portfolio.total_greeks().delta, 800.0);
    }
}
