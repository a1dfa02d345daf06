//! Loan-offer evaluation
//!
//! Banks publish offers with a minimum qualifying score; a merchant's trust
//! score adjusts the priced interest rate. Purely a computation over the
//! current score — no application state lives here.

use serde::{Deserialize, Serialize};

use bharosa_core::TrustScore;

/// A bank's standing loan offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOffer {
    pub id: String,
    pub bank_name: String,
    pub max_amount: u64,
    pub base_interest: f64,
    pub min_score: i32,
}

/// An offer priced against a concrete trust score.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedOffer {
    #[serde(flatten)]
    pub offer: LoanOffer,
    pub eligible: bool,
    pub adjusted_interest: f64,
}

/// Price each offer for the given score.
///
/// The score bonus scales linearly across the valid range; eligible offers
/// are discounted by twice the bonus, ineligible ones display a 5-point
/// penalty rate. Rates are rounded to one decimal place.
pub fn evaluate_offers(score: TrustScore, offers: &[LoanOffer]) -> Vec<EvaluatedOffer> {
    let bonus = (score.value() - TrustScore::MIN) as f64
        / (TrustScore::MAX - TrustScore::MIN) as f64;

    offers
        .iter()
        .map(|offer| {
            let eligible = score.value() >= offer.min_score;
            let adjusted = if eligible {
                offer.base_interest - bonus * 2.0
            } else {
                offer.base_interest + 5.0
            };
            EvaluatedOffer {
                offer: offer.clone(),
                eligible,
                adjusted_interest: (adjusted * 10.0).round() / 10.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offers() -> Vec<LoanOffer> {
        vec![
            LoanOffer {
                id: "b1".to_string(),
                bank_name: "Standard Trust Bank".to_string(),
                max_amount: 500_000,
                base_interest: 6.97,
                min_score: 700,
            },
            LoanOffer {
                id: "b4".to_string(),
                bank_name: "Sovereign Capital".to_string(),
                max_amount: 1_000_000,
                base_interest: 5.47,
                min_score: 800,
            },
        ]
    }

    #[test]
    fn test_eligible_offer_is_discounted() {
        let evaluated = evaluate_offers(TrustScore::new(742), &offers());

        let standard = &evaluated[0];
        assert!(standard.eligible);
        // bonus = (742 − 300) / 600 ≈ 0.7367; 6.97 − 2×bonus ≈ 5.5
        assert_eq!(standard.adjusted_interest, 5.5);
    }

    #[test]
    fn test_ineligible_offer_shows_penalty_rate() {
        let evaluated = evaluate_offers(TrustScore::new(742), &offers());

        let sovereign = &evaluated[1];
        assert!(!sovereign.eligible);
        assert_eq!(sovereign.adjusted_interest, 10.5);
    }

    #[test]
    fn test_minimum_score_boundary_is_inclusive() {
        let evaluated = evaluate_offers(TrustScore::new(700), &offers());
        assert!(evaluated[0].eligible);

        let evaluated = evaluate_offers(TrustScore::new(699), &offers());
        assert!(!evaluated[0].eligible);
    }
}
