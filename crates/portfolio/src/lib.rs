//! Aegis Portfolio Analytics
//!
//! Owns all per-asset mutable state of the engine: the last risk snapshot,
//! the append-only hedge history and the running aggregate Greeks.
//!
//! Appends for one asset are serialized by that asset's lock; different
//! assets never contend.

pub mod analytics;

pub use analytics::{LegAttribution, PortfolioAnalytics, PortfolioSnapshot};
