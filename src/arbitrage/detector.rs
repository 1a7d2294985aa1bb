//! Opportunity Detector
//!
//! Compares the two venues' quotes for the same fixed input and decides
//! whether the divergence clears the threshold. Pure integer arithmetic on
//! base units: the threshold is held in parts-per-billion so the boundary
//! `pA > pB * (1 + T)` is exact (equality is never an opportunity).
//!
//! Leg convention (both directions):
//!   sell leg: `amount_in` of token A on the richer venue, min out = lower quote × (1 − T)
//!   buy leg:  that min out of token B on the cheaper venue, min out = `amount_in`

use crate::types::{ArbDirection, ArbitrageOpportunity, Quote, SwapDirection, SwapLeg};
use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

/// Fixed-point scale for thresholds (1e9 = 100%)
const THRESHOLD_SCALE: u64 = 1_000_000_000;

/// Arbitrage threshold T as a fraction in [0, 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// T × 1e9, rounded down
    ppb: u64,
}

impl Threshold {
    pub fn new(fraction: Decimal) -> Result<Self, String> {
        if fraction.is_sign_negative() || fraction >= Decimal::ONE {
            return Err(format!("threshold {} must be in [0, 1)", fraction));
        }
        let ppb = (fraction * Decimal::from(THRESHOLD_SCALE))
            .floor()
            .to_u64()
            .ok_or_else(|| format!("threshold {} out of range", fraction))?;
        Ok(Self { ppb })
    }

    /// `high > low × (1 + T)`, strictly
    pub fn exceeds(&self, high: U256, low: U256) -> bool {
        let scale = U256::from(THRESHOLD_SCALE);
        high.saturating_mul(scale) > low.saturating_mul(scale + U256::from(self.ppb))
    }

    /// `amount × (1 − T)`, rounded down
    pub fn discount(&self, amount: U256) -> U256 {
        let scale = U256::from(THRESHOLD_SCALE);
        amount.saturating_mul(scale - U256::from(self.ppb)) / scale
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pct = Decimal::from(self.ppb) / Decimal::from(THRESHOLD_SCALE / 100);
        write!(f, "{}%", pct.normalize())
    }
}

/// Derive this cycle's opportunity, if any.
/// `quote_a` / `quote_b` must be quotes for the same `amount_in`.
pub fn detect_opportunity(
    quote_a: &Quote,
    quote_b: &Quote,
    threshold: &Threshold,
    amount_in: U256,
) -> Option<ArbitrageOpportunity> {
    let (direction, rich, cheap) = if threshold.exceeds(quote_a.amount_out, quote_b.amount_out) {
        (ArbDirection::SellAOnBuyB, quote_a, quote_b)
    } else if threshold.exceeds(quote_b.amount_out, quote_a.amount_out) {
        (ArbDirection::SellBOnBuyA, quote_b, quote_a)
    } else {
        return None;
    };

    let sell_leg = SwapLeg {
        venue: rich.venue,
        direction: SwapDirection::AToB,
        amount_in,
        min_amount_out: threshold.discount(cheap.amount_out),
    };
    let buy_leg = SwapLeg {
        venue: cheap.venue,
        direction: SwapDirection::BToA,
        amount_in: sell_leg.min_amount_out,
        min_amount_out: amount_in,
    };

    Some(ArbitrageOpportunity {
        direction,
        sell_leg,
        buy_leg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VenueId;
    use rust_decimal_macros::dec;

    fn quote(venue: VenueId, out: u64) -> Quote {
        Quote {
            venue,
            amount_in: U256::from(100u64),
            amount_out: U256::from(out),
            gas_estimate: None,
        }
    }

    fn one_percent() -> Threshold {
        Threshold::new(dec!(0.01)).unwrap()
    }

    #[test]
    fn test_boundary_is_exclusive() {
        // 101 is not > 100 * 1.01
        let a = quote(VenueId::Uniswap, 101);
        let b = quote(VenueId::Balancer, 100);
        assert_eq!(detect_opportunity(&a, &b, &one_percent(), U256::from(100u64)), None);
        assert_eq!(detect_opportunity(&b, &a, &one_percent(), U256::from(100u64)), None);
    }

    #[test]
    fn test_sell_a_buy_b() {
        let a = quote(VenueId::Uniswap, 102);
        let b = quote(VenueId::Balancer, 100);

        let opp = detect_opportunity(&a, &b, &one_percent(), U256::from(100u64)).unwrap();
        assert_eq!(opp.direction, ArbDirection::SellAOnBuyB);
        assert_eq!(opp.sell_leg.venue, VenueId::Uniswap);
        assert_eq!(opp.sell_leg.direction, SwapDirection::AToB);
        assert_eq!(opp.sell_leg.amount_in, U256::from(100u64));
        assert_eq!(opp.sell_leg.min_amount_out, U256::from(99u64));
        assert_eq!(opp.buy_leg.venue, VenueId::Balancer);
        assert_eq!(opp.buy_leg.direction, SwapDirection::BToA);
        assert_eq!(opp.buy_leg.amount_in, U256::from(99u64));
        assert_eq!(opp.buy_leg.min_amount_out, U256::from(100u64));
    }

    #[test]
    fn test_sell_b_buy_a_is_symmetric() {
        let a = quote(VenueId::Uniswap, 100);
        let b = quote(VenueId::Balancer, 102);

        let opp = detect_opportunity(&a, &b, &one_percent(), U256::from(100u64)).unwrap();
        assert_eq!(opp.direction, ArbDirection::SellBOnBuyA);
        assert_eq!(opp.sell_leg.venue, VenueId::Balancer);
        assert_eq!(opp.sell_leg.min_amount_out, U256::from(99u64));
        assert_eq!(opp.buy_leg.venue, VenueId::Uniswap);
        assert_eq!(opp.buy_leg.amount_in, U256::from(99u64));
    }

    #[test]
    fn test_exactly_one_direction_fires() {
        let thresholds = [dec!(0), dec!(0.005), dec!(0.01), dec!(0.05)];
        for t in thresholds {
            let threshold = Threshold::new(t).unwrap();
            for pa in (900u64..=1100).step_by(7) {
                for pb in (900u64..=1100).step_by(11) {
                    let a_rich = threshold.exceeds(U256::from(pa), U256::from(pb));
                    let b_rich = threshold.exceeds(U256::from(pb), U256::from(pa));
                    assert!(!(a_rich && b_rich), "both fired at {}/{} T={}", pa, pb, t);

                    let expected_a = Decimal::from(pa) > Decimal::from(pb) * (Decimal::ONE + t);
                    let expected_b = Decimal::from(pb) > Decimal::from(pa) * (Decimal::ONE + t);
                    assert_eq!(a_rich, expected_a, "{}/{} T={}", pa, pb, t);
                    assert_eq!(b_rich, expected_b, "{}/{} T={}", pa, pb, t);

                    let opp = detect_opportunity(
                        &quote(VenueId::Uniswap, pa),
                        &quote(VenueId::Balancer, pb),
                        &threshold,
                        U256::from(100u64),
                    );
                    match opp.map(|o| o.direction) {
                        Some(ArbDirection::SellAOnBuyB) => assert!(expected_a),
                        Some(ArbDirection::SellBOnBuyA) => assert!(expected_b),
                        None => assert!(!expected_a && !expected_b),
                    }
                }
            }
        }
    }

    #[test]
    fn test_threshold_range() {
        assert!(Threshold::new(dec!(-0.01)).is_err());
        assert!(Threshold::new(dec!(1)).is_err());
        assert!(Threshold::new(dec!(0)).is_ok());
        assert_eq!(one_percent().to_string(), "1%");
    }

    #[test]
    fn test_discount_rounds_down() {
        let t = one_percent();
        assert_eq!(t.discount(U256::from(100u64)), U256::from(99u64));
        assert_eq!(t.discount(U256::from(150u64)), U256::from(148u64));
    }
}
