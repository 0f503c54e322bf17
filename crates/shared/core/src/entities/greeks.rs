use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg};

/// Option sensitivities
///
/// - `delta`: per unit move of the underlying
/// - `gamma`: change of delta per unit move
/// - `theta`: value decay per calendar day
/// - `vega`: value change per one volatility point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64, theta: f64, vega: f64) -> Self {
        Self {
            delta,
            gamma,
            theta,
            vega,
        }
    }

    /// Pure linear exposure (spot or perpetual): delta only
    pub fn linear(size: f64) -> Self {
        Self {
            delta: size,
            ..Default::default()
        }
    }

    /// Scale every sensitivity by a signed position size
    pub fn scaled(&self, size: f64) -> Self {
        Self {
            delta: self.delta * size,
            gamma: self.gamma * size,
            theta: self.theta * size,
            vega: self.vega * size,
        }
    }
}

impl Add for Greeks {
    type Output = Greeks;

    fn add(self, rhs: Greeks) -> Greeks {
        Greeks {
            delta: self.delta + rhs.delta,
            gamma: self.gamma + rhs.gamma,
            theta: self.theta + rhs.theta,
            vega: self.vega + rhs.vega,
        }
    }
}

impl AddAssign for Greeks {
    fn add_assign(&mut self, rhs: Greeks) {
        *self = *self + rhs;
    }
}

impl Neg for Greeks {
    type Output = Greeks;

    fn neg(self) -> Greeks {
        self.scaled(-1.0)
    }
}

impl std::iter::Sum for Greeks {
    fn sum<I: Iterator<Item = Greeks>>(iter: I) -> Greeks {
        iter.fold(Greeks::default(), |acc, g| acc + g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_is_signed() {
        let g = Greeks::new(-0.4, 0.01, -2.0, 5.0);
        let short = g.scaled(-2.0);
        assert_eq!(short, Greeks::new(0.8, -0.02, 4.0, -10.0));
    }

    #[test]
    fn test_sum_and_negation() {
        let a = Greeks::new(0.5, 0.1, -1.0, 2.0);
        let b = -a;
        let total: Greeks = vec![a, b, Greeks::linear(3.0)].into_iter().sum();
        assert_eq!(total, Greeks::new(3.0, 0.0, 0.0, 0.0));
    }
}
