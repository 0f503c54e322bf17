//! Stress scenarios: instantaneous proportional price shocks

/// Price paths shifted by each shock, e.g. `[-0.1, 0.1]` for ±10% moves
///
/// Returns one path per shock, in shock order.
pub fn stress_scenarios(prices: &[f64], shocks: &[f64]) -> Vec<Vec<f64>> {
    shocks
        .iter()
        .map(|shock| prices.iter().map(|p| p * (1.0 + shock)).collect())
        .collect()
}

/// P&L of a signed position for each shock applied to `price`
pub fn stress_pnl(position_size: f64, price: f64, shocks: &[f64]) -> Vec<f64> {
    shocks.iter().map(|shock| position_size * price * shock).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_scenarios() {
        let paths = stress_scenarios(&[100.0, 200.0], &[-0.1, 0.5]);
        assert_eq!(paths, vec![vec![90.0, 180.0], vec![150.0, 300.0]]);
    }

    #[test]
    fn test_stress_pnl_signs() {
        let pnl = stress_pnl(-2.0, 100.0, &[-0.1, 0.1]);
        assert_eq!(pnl, vec![20.0, -20.0]);
    }
}
