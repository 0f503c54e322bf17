//! Aegis Core Domain
//!
//! Pure domain types for the Aegis risk & hedging engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod events;
pub mod instruments;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Greeks, HedgeResult, OptionLeg, Position, PricePoint, PriceSeries, RiskSnapshot, StrategyKind,
};
pub use error::{Error, Result};
pub use events::{MonitorEvent, Quote};
pub use instruments::{ExchangeId, InstrumentKind, OptionType, option_instrument};
pub use values::{Asset, Timestamp};
