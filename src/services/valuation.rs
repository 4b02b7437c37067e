//! NAV estimation and premium-rate helpers
//!
//! Pure arithmetic over constituent weights and prices; the pipeline
//! feeds the results into the premium and sentiment sub-scores.

use crate::constants::NAV_FEE_HAIRCUT;
use crate::models::HoldingsProfile;
use crate::providers::Holding;
use std::collections::HashMap;

/// Concentration profile of a constituent list: combined weight of the
/// five largest holdings and a diversity proxy of one group per five
/// constituents.
pub fn holdings_profile(holdings: &[Holding]) -> HoldingsProfile {
    let mut weights: Vec<f64> = holdings.iter().map(|h| h.weight).collect();
    weights.sort_by(|a, b| b.total_cmp(a));

    HoldingsProfile {
        top5_weight: weights.iter().take(5).sum(),
        group_count: holdings.len() / 5,
    }
}

/// Estimate the fund NAV as the weighted sum of priced constituents,
/// discounted by the management-fee haircut. Returns `None` when no
/// constituent can be priced.
pub fn estimate_nav(holdings: &[Holding], prices: &HashMap<String, f64>) -> Option<f64> {
    let nav: f64 = holdings
        .iter()
        .filter_map(|h| prices.get(&h.code).map(|price| price * h.weight))
        .sum();

    if nav <= 0.0 {
        return None;
    }
    Some(nav * NAV_FEE_HAIRCUT)
}

/// Premium rate: percentage deviation of market price from estimated NAV
pub fn premium_rate(market_price: f64, nav: f64) -> f64 {
    (market_price - nav) / nav * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(code: &str, weight: f64) -> Holding {
        Holding {
            code: code.to_string(),
            weight,
        }
    }

    #[test]
    fn test_holdings_profile() {
        let holdings: Vec<Holding> = (0..12)
            .map(|i| holding(&format!("s{}", i), if i < 5 { 0.1 } else { 0.5 / 7.0 }))
            .collect();

        let profile = holdings_profile(&holdings);
        assert!((profile.top5_weight - 0.5).abs() < 1e-9);
        assert_eq!(profile.group_count, 2);
    }

    #[test]
    fn test_estimate_nav_weighted_sum() {
        let holdings = vec![holding("600519", 0.6), holding("000858", 0.4)];
        let prices = HashMap::from([
            ("600519".to_string(), 100.0),
            ("000858".to_string(), 50.0),
        ]);

        // 0.6*100 + 0.4*50 = 80, then the fee haircut
        let nav = estimate_nav(&holdings, &prices).unwrap();
        assert!((nav - 80.0 * NAV_FEE_HAIRCUT).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_nav_ignores_unpriced_constituents() {
        let holdings = vec![holding("600519", 0.6), holding("unknown", 0.4)];
        let prices = HashMap::from([("600519".to_string(), 100.0)]);
        let nav = estimate_nav(&holdings, &prices).unwrap();
        assert!((nav - 60.0 * NAV_FEE_HAIRCUT).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_nav_none_without_prices() {
        let holdings = vec![holding("600519", 1.0)];
        assert!(estimate_nav(&holdings, &HashMap::new()).is_none());
        assert!(estimate_nav(&[], &HashMap::new()).is_none());
    }

    #[test]
    fn test_premium_rate() {
        assert!((premium_rate(101.0, 100.0) - 1.0).abs() < 1e-9);
        assert!((premium_rate(99.0, 100.0) + 1.0).abs() < 1e-9);
    }
}
