//! Per-channel verification state
//!
//! Each verification channel (phone OTP, government-ID OTP, fingerprint,
//! face, location) carries its own tagged state, so a half-verified flow
//! cannot be represented by accident. Evidence is typed per channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::BiometricHash;

/// State of a single verification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verification<E> {
    /// No verification attempted yet
    Unverified,
    /// A verification operation is in flight
    Pending,
    /// Verified, with the evidence the channel produced
    Verified(E),
}

impl<E> Verification<E> {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Verification::Pending)
    }

    pub fn evidence(&self) -> Option<&E> {
        match self {
            Verification::Verified(evidence) => Some(evidence),
            _ => None,
        }
    }

    /// Drop any prior result, e.g. after the verified value was edited
    pub fn reset(&mut self) {
        *self = Verification::Unverified;
    }
}

impl<E> Default for Verification<E> {
    fn default() -> Self {
        Verification::Unverified
    }
}

/// Evidence of a completed OTP-style confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpEvidence {
    /// The one-time code that was dispatched (surfaced directly in the
    /// prototype UI; never for production use)
    pub code: String,

    /// When the confirmation completed
    pub verified_at: DateTime<Utc>,
}

/// Evidence of a completed biometric capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvidence {
    /// Opaque hash standing in for the captured scan
    pub hash: BiometricHash,

    /// When the capture completed
    pub captured_at: DateTime<Utc>,
}

/// Evidence of a confirmed business location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEvidence {
    /// Resolved address string
    pub address: String,

    /// When the location was confirmed
    pub confirmed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_transitions() {
        let mut channel: Verification<OtpEvidence> = Verification::default();
        assert!(!channel.is_verified());
        assert!(channel.evidence().is_none());

        channel = Verification::Pending;
        assert!(channel.is_pending());

        channel = Verification::Verified(OtpEvidence {
            code: "482913".to_string(),
            verified_at: Utc::now(),
        });
        assert!(channel.is_verified());
        assert_eq!(channel.evidence().unwrap().code, "482913");

        channel.reset();
        assert!(!channel.is_verified());
    }
}
