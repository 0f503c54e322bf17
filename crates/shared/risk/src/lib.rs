//! Aegis Risk Calculations
//!
//! Pure functions over position sizes and price series. No I/O, no shared
//! state: identical inputs always give identical outputs.
//!
//! - **Delta**: net delta, threshold limit, hedge trigger, hedge amount
//! - **Tail risk**: parametric VaR with empirical fallback, max drawdown
//! - **Co-movement**: correlation matrix, beta, beta-weighted perp sizing
//! - **Stress**: shocked price paths and P&L per shock

pub mod calculator;
pub mod stats;
pub mod stress;

pub use calculator::{
    CorrelationMatrix, NetDeltaMode, beta, correlation_matrix, evaluate, hedge_amount,
    max_drawdown, needs_hedge, net_delta, net_delta_with, perp_hedge_ratio, threshold_limit,
    value_at_risk,
};
pub use stress::{stress_pnl, stress_scenarios};
