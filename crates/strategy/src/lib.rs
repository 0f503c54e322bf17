//! Aegis Strategy Engine
//!
//! Composes the risk calculator and the options hedger into the four named
//! hedge strategies. Every invocation is stateless and synchronous:
//!
//! - **protective_put**: long put sized to the spot exposure
//! - **covered_call**: short call against the spot holding
//! - **collar**: long put + short call
//! - **delta_neutral**: perpetual adjustment `-net_delta` when the threshold is breached
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aegis_strategy::{EngineConfig, StrategyEngine, StrategyParams, StrategyRequest};
//!
//! let engine = StrategyEngine::new(EngineConfig::default(), clock);
//! let request = StrategyRequest::from_name("collar", &params)?;
//! let result = engine.run(&request)?;
//! ```

pub mod cost;
pub mod engine;
pub mod request;

// Re-export main types
pub use cost::{LinearFee, ZeroCost};
pub use engine::{EngineConfig, PutSizing, StrategyEngine};
pub use request::{StrategyParams, StrategyRequest};
