use aegis_core::StrategyKind;

/// Adjusts the cost of a hedge for slippage and fees
///
/// Receives the model cost (positive = paid, negative = received) and the
/// signed hedge size, returns the adjusted cost.
pub trait CostAdjuster: Send + Sync {
    fn adjust(&self, strategy: StrategyKind, size: f64, cost: f64) -> f64;

    fn name(&self) -> &str {
        "CostAdjuster"
    }
}
