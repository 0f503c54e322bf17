//! Cost adjusters for slippage and fees

use aegis_core::StrategyKind;
use aegis_ports::CostAdjuster;

/// Model cost passes through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroCost;

impl CostAdjuster for ZeroCost {
    fn adjust(&self, _strategy: StrategyKind, _size: f64, cost: f64) -> f64 {
        cost
    }

    fn name(&self) -> &str {
        "ZeroCost"
    }
}

/// Flat fee per unit traded: `cost + |size| * fee_per_unit`
#[derive(Debug, Clone, Copy)]
pub struct LinearFee {
    pub fee_per_unit: f64,
}

impl LinearFee {
    pub fn new(fee_per_unit: f64) -> Self {
        Self { fee_per_unit }
    }
}

impl CostAdjuster for LinearFee {
    fn adjust(&self, _strategy: StrategyKind, size: f64, cost: f64) -> f64 {
        cost + size.abs() * self.fee_per_unit
    }

    fn name(&self) -> &str {
        "LinearFee"
    }
}
