//! Aegis Options
//!
//! European option pricing and hedge-leg construction:
//!
//! - **Black-Scholes**: closed-form price and Greeks (theta per day, vega
//!   per vol point)
//! - **OptionsHedger**: validated hedge parameters, priced and named legs,
//!   delta-matched put sizing

pub mod black_scholes;
pub mod hedger;

pub use black_scholes::BlackScholes;
pub use hedger::{HedgeParams, OptionsHedger};
