//! Market data adapters
//!
//! - **PriorityMarketData**: tries an asset's exchanges in preference order
//! - **InMemoryMarketData**: scripted data with failure injection
//! - **SimulatedMarketData**: seeded random walk standing in for exchange adapters

mod memory;
mod priority;
mod simulated;

pub use memory::InMemoryMarketData;
pub use priority::PriorityMarketData;
pub use simulated::{SimulatedAsset, SimulatedMarketData};
