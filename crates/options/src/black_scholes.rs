//! Black-Scholes closed form
//!
//! No dividend yield; continuous risk-free rate.

use aegis_core::values::DAYS_PER_YEAR;
use aegis_core::{Error, Greeks, OptionType, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// Validated pricing inputs for one strike and expiry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackScholes {
    pub spot: f64,
    pub strike: f64,
    /// Year fraction `days / 365`
    pub time_to_expiry: f64,
    pub rate: f64,
    pub volatility: f64,
}

impl BlackScholes {
    /// Build from calendar days to expiry
    ///
    /// Fails with `InvalidParameter` unless spot, strike, expiry and
    /// volatility are all finite and strictly positive.
    pub fn new(spot: f64, strike: f64, days_to_expiry: f64, rate: f64, volatility: f64) -> Result<Self> {
        let time_to_expiry = days_to_expiry / DAYS_PER_YEAR;
        check_positive("time to expiry", time_to_expiry)?;
        check_positive("volatility", volatility)?;
        check_positive("strike", strike)?;
        check_positive("spot price", spot)?;
        if !rate.is_finite() {
            return Err(Error::invalid(format!("risk-free rate must be finite, got {rate}")));
        }

        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            rate,
            volatility,
        })
    }

    pub fn d1(&self) -> f64 {
        let vol_sqrt_t = self.volatility * self.time_to_expiry.sqrt();
        ((self.spot / self.strike).ln()
            + (self.rate + 0.5 * self.volatility * self.volatility) * self.time_to_expiry)
            / vol_sqrt_t
    }

    pub fn d2(&self) -> f64 {
        self.d1() - self.volatility * self.time_to_expiry.sqrt()
    }

    fn discount(&self) -> f64 {
        (-self.rate * self.time_to_expiry).exp()
    }

    /// Premium per unit of underlying
    pub fn price(&self, option_type: OptionType) -> f64 {
        let n = Normal::standard();
        let (d1, d2) = (self.d1(), self.d2());
        let pv_strike = self.strike * self.discount();

        match option_type {
            OptionType::Call => self.spot * n.cdf(d1) - pv_strike * n.cdf(d2),
            OptionType::Put => pv_strike * n.cdf(-d2) - self.spot * n.cdf(-d1),
        }
    }

    /// Per-unit Greeks; gamma and vega are shared by puts and calls
    pub fn greeks(&self, option_type: OptionType) -> Greeks {
        let n = Normal::standard();
        let (d1, d2) = (self.d1(), self.d2());
        let sqrt_t = self.time_to_expiry.sqrt();
        let pdf_d1 = n.pdf(d1);
        let pv_strike = self.strike * self.discount();

        let gamma = pdf_d1 / (self.spot * self.volatility * sqrt_t);
        let vega = self.spot * pdf_d1 * sqrt_t / 100.0;
        let decay = -self.spot * pdf_d1 * self.volatility / (2.0 * sqrt_t);

        let (delta, theta_annual) = match option_type {
            OptionType::Call => (n.cdf(d1), decay - self.rate * pv_strike * n.cdf(d2)),
            OptionType::Put => (n.cdf(d1) - 1.0, decay + self.rate * pv_strike * n.cdf(-d2)),
        };

        Greeks::new(delta, gamma, theta_annual / DAYS_PER_YEAR, vega)
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!("{name} must be > 0, got {value}")))
    }
}
