mod greeks;
mod hedge;
mod position;
mod series;
mod snapshot;

pub use greeks::Greeks;
pub use hedge::{HedgeResult, OptionLeg, StrategyKind};
pub use position::Position;
pub use series::{PricePoint, PriceSeries};
pub use snapshot::RiskSnapshot;
