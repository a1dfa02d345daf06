//! Peer ratings for merchants
//!
//! A rater holds at most one rating per merchant; a later audit of the same
//! merchant updates the existing rating instead of creating a second one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{CustomerId, MerchantId};

/// Rating outside the 1–5 range
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct InvalidRating(pub u8);

/// A discrete merchant rating, 1 through 5 stars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RatingValue(u8);

impl RatingValue {
    pub fn new(stars: u8) -> Result<Self, InvalidRating> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(InvalidRating(stars))
        }
    }

    pub fn stars(&self) -> u8 {
        self.0
    }
}

/// Unique identifier for a rating
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingId(pub String);

impl RatingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("rat_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for RatingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rating left by a customer for a merchant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Unique rating identifier
    pub id: RatingId,

    /// The rated merchant
    pub merchant_id: MerchantId,

    /// Merchant display name at rating time
    pub merchant_name: String,

    /// The customer who left the rating
    pub rater: CustomerId,

    /// Star value, 1–5
    pub value: RatingValue,

    /// Free-text comment
    pub comment: String,

    /// Date the rating was (last) submitted
    pub date: NaiveDate,

    /// Location string attached to the rating
    pub location: String,
}

/// Network standing derived from a merchant's average rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustLevel {
    Good,
    Average,
    Poor,
}

impl TrustLevel {
    pub fn from_average(average: f64) -> Self {
        if average >= 4.0 {
            TrustLevel::Good
        } else if average >= 3.0 {
            TrustLevel::Average
        } else {
            TrustLevel::Poor
        }
    }
}
