//! Aegis Ports
//!
//! Port definitions (traits) for the Aegis hedging engine.
//! These define the boundaries between the pure calculation core and the
//! external collaborators (exchanges, notification layer, fee models).

mod alert;
mod clock;
mod cost;
mod market_data;

pub use alert::AlertSink;
pub use clock::Clock;
pub use cost::CostAdjuster;
pub use market_data::MarketDataSource;
