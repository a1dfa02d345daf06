//! Bharosa Core
//!
//! Core domain types for the Bharosa trust network.
//! This crate defines the fundamental data structures used across
//! the entire Bharosa ecosystem.

pub mod identity;
pub mod rating;
pub mod score;
pub mod verification;

pub use identity::{
    BiometricHash, CustomerId, CustomerRecord, IncomeBracket, MerchantId, MerchantRecord,
    MerchantRef, GOVERNMENT_ID_LEN, PHONE_LEN, TAX_ID_LEN, TAX_ID_MIN_LEN,
};
pub use rating::{InvalidRating, Rating, RatingId, RatingValue, TrustLevel};
pub use score::TrustScore;
pub use verification::{CaptureEvidence, LocationEvidence, OtpEvidence, Verification};
