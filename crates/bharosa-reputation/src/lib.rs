//! Bharosa Reputation
//!
//! Converts discrete peer ratings into bounded trust-score movement.
//! Each star value maps to a fixed point delta, damped so no single rating
//! dominates the aggregate; scores stay inside `[300, 900]`; editing a
//! rating applies only the marginal change.

pub mod advice;
pub mod ledger;
pub mod offers;

pub use advice::{network_advice, Advice, AdviceTone};
pub use ledger::{LedgerError, MerchantStanding, RatingOutcome, ReputationLedger};
pub use offers::{evaluate_offers, EvaluatedOffer, LoanOffer};

use bharosa_core::RatingValue;

/// Point deltas for 1 through 5 stars.
pub const RATING_POINTS: [i32; 5] = [-20, -10, 0, 10, 20];

/// Damping factor applied to every individual rating's effect.
pub const ADJUSTMENT_DAMPING: f64 = 0.4;

/// Raw point delta for a star value.
pub fn rating_points(value: RatingValue) -> i32 {
    RATING_POINTS[(value.stars() - 1) as usize]
}

/// Damped score adjustment for a star value.
pub fn score_adjustment(value: RatingValue) -> f64 {
    rating_points(value) as f64 * ADJUSTMENT_DAMPING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_table() {
        let expected = [-20, -10, 0, 10, 20];
        for stars in 1..=5u8 {
            let value = RatingValue::new(stars).unwrap();
            assert_eq!(rating_points(value), expected[(stars - 1) as usize]);
        }
    }

    #[test]
    fn test_points_monotonically_non_decreasing() {
        let mut last = i32::MIN;
        for stars in 1..=5u8 {
            let points = rating_points(RatingValue::new(stars).unwrap());
            assert!(points >= last);
            last = points;
        }
    }

    #[test]
    fn test_damped_adjustment() {
        assert_eq!(score_adjustment(RatingValue::new(5).unwrap()), 8.0);
        assert_eq!(score_adjustment(RatingValue::new(1).unwrap()), -8.0);
        assert_eq!(score_adjustment(RatingValue::new(3).unwrap()), 0.0);
    }
}
