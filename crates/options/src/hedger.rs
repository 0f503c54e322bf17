//! Options Hedger
//!
//! Turns validated hedge parameters into priced, named option legs.

use aegis_core::{Error, Greeks, OptionLeg, OptionType, Result, Timestamp, option_instrument};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::black_scholes::BlackScholes;

/// Put delta magnitude below which delta-matched sizing is refused
const MIN_PUT_DELTA: f64 = 1e-6;

/// Inputs shared by every leg of one hedge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeParams {
    /// Spot exposure being hedged (signed)
    pub spot_qty: f64,
    pub strike: f64,
    pub days_to_expiry: f64,
    /// Annualised, e.g. 0.6
    pub volatility: f64,
    pub spot_price: f64,
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone)]
pub struct OptionsHedger {
    params: HedgeParams,
    model: BlackScholes,
}

impl OptionsHedger {
    /// Validate parameters; fails with `InvalidParameter` on non-positive
    /// expiry, volatility, strike or spot price
    pub fn new(params: HedgeParams) -> Result<Self> {
        if !params.spot_qty.is_finite() {
            return Err(Error::invalid(format!(
                "spot_qty must be finite, got {}",
                params.spot_qty
            )));
        }
        let model = BlackScholes::new(
            params.spot_price,
            params.strike,
            params.days_to_expiry,
            params.risk_free_rate,
            params.volatility,
        )?;
        Ok(Self { params, model })
    }

    pub fn premium(&self, option_type: OptionType) -> f64 {
        self.model.price(option_type)
    }

    pub fn unit_greeks(&self, option_type: OptionType) -> Greeks {
        self.model.greeks(option_type)
    }

    /// Expiry timestamp `days_to_expiry` after `now`
    pub fn expiry(&self, now: Timestamp) -> Result<Timestamp> {
        let millis = (self.params.days_to_expiry * 86_400_000.0).round();
        TimeDelta::try_milliseconds(millis as i64)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| {
                Error::invalid(format!(
                    "days_to_expiry out of range: {}",
                    self.params.days_to_expiry
                ))
            })
    }

    /// Price one leg of `size` contracts (positive = bought, negative = sold)
    pub fn price_leg(
        &self,
        asset: &str,
        option_type: OptionType,
        size: f64,
        now: Timestamp,
    ) -> Result<OptionLeg> {
        let premium = self.premium(option_type);
        let instrument = option_instrument(asset, self.expiry(now)?, self.params.strike, option_type);

        Ok(OptionLeg {
            instrument,
            option_type,
            strike: self.params.strike,
            days_to_expiry: self.params.days_to_expiry,
            volatility: self.params.volatility,
            size,
            premium,
            cost: size * premium,
            greeks: self.unit_greeks(option_type).scaled(size),
        })
    }

    /// Whole number of puts whose combined delta covers the spot exposure:
    /// `ceil(|spot_qty| / |put delta|)`, signed like `spot_qty`
    pub fn delta_matched_put_qty(&self) -> Result<f64> {
        let put_delta = self.unit_greeks(OptionType::Put).delta.abs();
        if put_delta < MIN_PUT_DELTA {
            return Err(Error::invalid(format!(
                "put delta {put_delta:e} too small to size a delta-matched hedge"
            )));
        }
        let qty = (self.params.spot_qty.abs() / put_delta).ceil();
        Ok(if self.params.spot_qty < 0.0 { -qty } else { qty })
    }
}
