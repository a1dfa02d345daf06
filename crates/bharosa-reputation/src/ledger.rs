//! Reputation ledger
//!
//! Holds merchant standings (score plus ratings) behind a single lock, so a
//! score adjustment and the rating upsert it belongs to are applied as one
//! unit — a rating is recorded if and only if its adjustment landed.

use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use bharosa_core::{
    CustomerId, MerchantId, Rating, RatingId, RatingValue, TrustLevel, TrustScore,
};

use crate::score_adjustment;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown merchant: {0}")]
    UnknownMerchant(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// A merchant's standing on the network.
///
/// Seeded merchants carry a prior average and count from before the ledger
/// existed; live ratings are folded into the displayed average on top.
#[derive(Debug, Clone, Serialize)]
pub struct MerchantStanding {
    pub merchant_id: MerchantId,
    pub name: String,
    pub location: String,
    pub score: TrustScore,
    pub prior_average: f64,
    pub prior_count: u32,
    pub ratings: Vec<Rating>,
}

impl MerchantStanding {
    pub fn new(
        merchant_id: MerchantId,
        name: impl Into<String>,
        location: impl Into<String>,
        score: TrustScore,
    ) -> Self {
        Self {
            merchant_id,
            name: name.into(),
            location: location.into(),
            score,
            prior_average: 0.0,
            prior_count: 0,
            ratings: Vec::new(),
        }
    }

    /// Attach pre-ledger rating history.
    pub fn with_history(mut self, average: f64, count: u32) -> Self {
        self.prior_average = average;
        self.prior_count = count;
        self
    }

    /// Average over prior history plus live ratings, if any exist.
    pub fn average_rating(&self) -> Option<f64> {
        let live_sum: u32 = self.ratings.iter().map(|r| r.value.stars() as u32).sum();
        let count = self.prior_count + self.ratings.len() as u32;
        if count == 0 {
            return None;
        }
        let total = self.prior_average * self.prior_count as f64 + live_sum as f64;
        Some(total / count as f64)
    }

    pub fn trust_level(&self) -> Option<TrustLevel> {
        self.average_rating().map(TrustLevel::from_average)
    }
}

/// Result of submitting or editing a rating.
#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub rating: Rating,
    pub score: TrustScore,
    pub adjustment: f64,
    pub edited: bool,
}

/// In-memory reputation ledger, constructed once per process (or per test)
/// and shared by reference.
pub struct ReputationLedger {
    standings: RwLock<Vec<MerchantStanding>>,
}

impl ReputationLedger {
    pub fn new() -> Self {
        Self {
            standings: RwLock::new(Vec::new()),
        }
    }

    /// Register a merchant standing (typically at registration finalize or
    /// from seed data).
    pub fn register(&self, standing: MerchantStanding) -> Result<(), LedgerError> {
        let mut standings = self
            .standings
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        standings.push(standing);
        Ok(())
    }

    /// Submit a rating, applying the damped score adjustment and the rating
    /// upsert under one lock.
    ///
    /// A first rating from this rater applies `delta(value) × damping`; an
    /// edit applies `(delta(new) − delta(old)) × damping` so the effect is
    /// never double-counted. The score is clamped after every adjustment.
    pub fn submit_rating(
        &self,
        rater: &CustomerId,
        merchant_id: &MerchantId,
        value: RatingValue,
        comment: &str,
    ) -> Result<RatingOutcome, LedgerError> {
        let mut standings = self
            .standings
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let standing = standings
            .iter_mut()
            .find(|s| &s.merchant_id == merchant_id)
            .ok_or_else(|| LedgerError::UnknownMerchant(merchant_id.to_string()))?;

        let today = Utc::now().date_naive();
        let existing = standing.ratings.iter_mut().find(|r| &r.rater == rater);

        let (rating, adjustment, edited) = match existing {
            Some(previous) => {
                let adjustment = score_adjustment(value) - score_adjustment(previous.value);
                previous.value = value;
                previous.comment = comment.to_string();
                previous.date = today;
                (previous.clone(), adjustment, true)
            }
            None => {
                let rating = Rating {
                    id: RatingId::generate(),
                    merchant_id: standing.merchant_id.clone(),
                    merchant_name: standing.name.clone(),
                    rater: rater.clone(),
                    value,
                    comment: comment.to_string(),
                    date: today,
                    location: standing.location.clone(),
                };
                standing.ratings.push(rating.clone());
                (rating, score_adjustment(value), false)
            }
        };

        standing.score = standing.score.adjusted_by(adjustment);

        Ok(RatingOutcome {
            rating,
            score: standing.score,
            adjustment,
            edited,
        })
    }

    pub fn standing(&self, merchant_id: &MerchantId) -> Result<Option<MerchantStanding>, LedgerError> {
        let standings = self
            .standings
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(standings
            .iter()
            .find(|s| &s.merchant_id == merchant_id)
            .cloned())
    }

    pub fn standings(&self) -> Result<Vec<MerchantStanding>, LedgerError> {
        let standings = self
            .standings
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(standings.clone())
    }
}

impl Default for ReputationLedger {
    fn default() -> Self {
        Self::new()
    }
}
