//! Aegis Runner - Risk Monitoring Runtime
//!
//! Ties the pure calculation crates to market data and the outside world:
//!
//! - **Config**: JSON monitoring configuration with env overrides
//! - **Market**: exchange-priority fallback, in-memory and simulated sources
//! - **Scheduler**: periodic per-asset risk evaluation (STOPPED/RUNNING)
//! - **Service**: the operations exposed to the command layer
//! - **Alerts**: log and channel sinks for monitoring events
//!
//! ## Architecture
//!
//! ```text
//!   MarketDataSource (per exchange)
//!            │ positions, prices, vol
//!            ▼
//!   ┌─────────────────────┐  breach  ┌─────────────────┐
//!   │ MonitoringScheduler │─────────►│ StrategyEngine  │
//!   │  (RiskCalculator)   │          │ (OptionsHedger) │
//!   └──────────┬──────────┘          └────────┬────────┘
//!              │ snapshots                    │ HedgeResult
//!              ▼                              ▼
//!   ┌─────────────────────────────────────────────────┐
//!   │               PortfolioAnalytics                │
//!   └─────────────────────────────────────────────────┘
//!             │ MonitorEvent
//!             ▼
//!         AlertSink ──► notification layer
//! ```

pub mod alert;
pub mod config;
pub mod market;
pub mod scheduler;
pub mod service;

// Re-export main types
pub use alert::{ChannelAlertSink, LogAlertSink};
pub use config::{
    BreachAction, ConfigError, MonitorConfig, OptionDefaults, TrackedAsset, load_config,
    load_config_from_str, load_default_config,
};
pub use market::{InMemoryMarketData, PriorityMarketData, SimulatedAsset, SimulatedMarketData};
pub use scheduler::{AssetFailure, CycleReport, MonitorSettings, MonitorState, MonitoringScheduler};
pub use service::{BetaEstimate, HedgeService, RiskReport, StressReport};
