use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// Option type: Call (right to buy) or Put (right to sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "C"),
            OptionType::Put => write!(f, "P"),
        }
    }
}

/// Exchange-style option name, e.g. `BTC-19NOV26-90000-P`
///
/// `expiry` is the option's expiration time; the strike is rounded to 8
/// decimals and printed without trailing zeros.
pub fn option_instrument(asset: &str, expiry: Timestamp, strike: f64, option_type: OptionType) -> String {
    let strike = (strike * 1e8).round() / 1e8;
    format!(
        "{}-{}-{}-{}",
        asset.to_ascii_uppercase(),
        expiry.format("%-d%b%y").to_string().to_uppercase(),
        strike,
        option_type
    )
}
