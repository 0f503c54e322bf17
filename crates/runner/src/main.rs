//! Aegis Binary
//!
//! Runs periodic risk monitoring against the simulated market until Ctrl-C.

use aegis_clock::SystemClock;
use aegis_runner::{
    HedgeService, LogAlertSink, SimulatedAsset, SimulatedMarketData, load_config,
    load_default_config,
};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = match std::env::var("AEGIS_CONFIG") {
        Ok(path) => {
            info!("[MONITOR] Loading config from {path}");
            load_config(path)?
        }
        Err(_) => load_default_config()?,
    };
    config.apply_env_overrides()?;
    config.validate()?;

    let market = Arc::new(SimulatedMarketData::new(SimulatedAsset::defaults()));
    let service = HedgeService::new(
        config,
        market,
        Arc::new(LogAlertSink),
        Arc::new(SystemClock),
    );

    service.start_monitoring();
    tokio::signal::ctrl_c().await?;
    service.stop_monitoring();

    for asset in service.portfolio().assets() {
        let snapshot = service.portfolio_snapshot(&asset).await;
        info!(
            "[PORTFOLIO] {asset}: delta {:.4}, net P&L {:.2} over {} hedges",
            snapshot.greeks.delta,
            snapshot.net_pnl,
            service.get_history(&asset, usize::MAX).len()
        );
    }
    Ok(())
}
