//! Bounded merchant trust score

use serde::{Deserialize, Serialize};

/// A merchant's trust/credit score, always within `[300, 900]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrustScore(i32);

impl TrustScore {
    pub const MIN: i32 = 300;
    pub const MAX: i32 = 900;

    /// Construct a score, clamping into the valid range.
    pub fn new(value: i32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Apply a (possibly fractional) adjustment and clamp the result.
    pub fn adjusted_by(&self, delta: f64) -> Self {
        let adjusted = (self.0 as f64 + delta).round() as i32;
        Self::new(adjusted)
    }
}

impl std::fmt::Display for TrustScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
