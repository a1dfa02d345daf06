//! Tiered network advice
//!
//! Local, deterministic guidance derived from a merchant's average rating.
//! The richer generative advisory copy lives in `bharosa-advisor`; this tier
//! mapping always works offline.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdviceTone {
    Trust,
    Decent,
    Caution,
}

#[derive(Debug, Clone, Serialize)]
pub struct Advice {
    pub message: &'static str,
    pub tone: AdviceTone,
}

/// Map an average rating to the advisory shown next to a merchant.
pub fn network_advice(average_rating: f64) -> Advice {
    if average_rating >= 4.0 {
        Advice {
            message: "You can trust this shop as its rating is good. It consistently demonstrates high reliability and service quality within our network.",
            tone: AdviceTone::Trust,
        }
    } else if average_rating >= 3.0 {
        Advice {
            message: "This merchant has a decent standing. It is suggested that you keep transactions smaller initially or verify settlement timelines with the owner. It is generally safe for routine purchases.",
            tone: AdviceTone::Decent,
        }
    } else {
        Advice {
            message: "Based on current network sentiment, you might want to consider alternative merchants for high-value items. It is suggested to clarify all credit terms strictly before proceeding, as some users have reported inconsistencies.",
            tone: AdviceTone::Caution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(network_advice(4.8).tone, AdviceTone::Trust);
        assert_eq!(network_advice(4.0).tone, AdviceTone::Trust);
        assert_eq!(network_advice(3.5).tone, AdviceTone::Decent);
        assert_eq!(network_advice(3.0).tone, AdviceTone::Decent);
        assert_eq!(network_advice(2.1).tone, AdviceTone::Caution);
    }
}
