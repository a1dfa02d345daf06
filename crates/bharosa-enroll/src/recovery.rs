//! Forgot-ID recovery sub-flow
//!
//! Independent of the main registration steps: collect a phone number,
//! dispatch a one-time code, and on exact code entry allow the owning flow
//! to reveal the matched record's primary identifier. A wrong code is a
//! retryable error with no attempt limit.

use std::sync::Arc;

use bharosa_core::OtpEvidence;

use crate::verify::OtpDispatcher;
use crate::EnrollError;

/// Required length of the recovery phone number.
pub const RECOVERY_PHONE_LEN: usize = 10;

pub struct IdRecovery {
    otp: Arc<dyn OtpDispatcher>,
    sent: Option<OtpEvidence>,
    revealed: bool,
}

impl IdRecovery {
    pub fn new(otp: Arc<dyn OtpDispatcher>) -> Self {
        Self {
            otp,
            sent: None,
            revealed: false,
        }
    }

    /// Dispatch a recovery code to the given phone number and return it
    /// (the prototype surfaces the code directly).
    pub async fn request_code(&mut self, phone: &str) -> Result<OtpEvidence, EnrollError> {
        if phone.len() != RECOVERY_PHONE_LEN || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(EnrollError::Incomplete(
                "a 10-digit registered phone number is required",
            ));
        }
        let evidence = self.otp.dispatch(phone).await?;
        self.sent = Some(evidence.clone());
        self.revealed = false;
        Ok(evidence)
    }

    /// Compare the entered code against the dispatched one.
    pub fn confirm(&mut self, entered: &str) -> Result<(), EnrollError> {
        let sent = self.sent.as_ref().ok_or(EnrollError::WrongStage)?;
        if sent.code == entered {
            self.revealed = true;
            Ok(())
        } else {
            Err(EnrollError::RecoveryCodeMismatch)
        }
    }

    /// Whether the code was confirmed and the identifier may be revealed.
    pub fn revealed(&self) -> bool {
        self.revealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::SimulatedOtpDispatcher;
    use std::time::Duration;

    fn recovery() -> IdRecovery {
        IdRecovery::new(Arc::new(SimulatedOtpDispatcher::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn test_requires_ten_digit_phone() {
        let mut flow = recovery();
        assert!(matches!(
            flow.request_code("98765").await,
            Err(EnrollError::Incomplete(_))
        ));
        assert!(flow.request_code("9876543210").await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_code_is_retryable() {
        let mut flow = recovery();
        let sent = flow.request_code("9876543210").await.unwrap();

        assert!(matches!(
            flow.confirm("000000"),
            Err(EnrollError::RecoveryCodeMismatch)
        ));
        assert!(!flow.revealed());

        // The flow stays open; the correct code still works.
        flow.confirm(&sent.code).unwrap();
        assert!(flow.revealed());
    }

    #[tokio::test]
    async fn test_confirm_before_dispatch_is_rejected() {
        let mut flow = recovery();
        assert!(matches!(
            flow.confirm("123456"),
            Err(EnrollError::WrongStage)
        ));
    }
}
