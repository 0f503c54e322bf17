//! Instrument conventions for hedged assets
//!
//! - Exchange identifiers and their symbol formats (spot, perpetual)
//! - Option instrument naming (BTC-19NOV26-90000-P)

mod exchange;
mod option;

pub use exchange::{ExchangeId, InstrumentKind};
pub use option::{OptionType, option_instrument};
