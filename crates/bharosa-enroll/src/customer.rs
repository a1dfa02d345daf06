//! Customer registration flow
//!
//! A single collection step (name, phone OTP, fingerprint, face) followed
//! directly by credential issuance; customers have no tax ID and no review
//! step. The identity matcher runs after every verification signal, and a
//! matched returning customer is routed to sign-in-by-ID (or the forgot-ID
//! recovery sub-flow) instead of a duplicate registration.

use std::sync::Arc;

use serde::Serialize;

use bharosa_core::{
    CaptureEvidence, CustomerId, CustomerRecord, OtpEvidence, Verification, PHONE_LEN,
};
use bharosa_registry::{CustomerEvidence, IdentityStore};

use crate::credential::generate_customer_id;
use crate::recovery::IdRecovery;
use crate::verify::{BiometricSensor, OtpDispatcher};
use crate::EnrollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStage {
    Collect,
    Complete,
}

pub struct CustomerEnrollment {
    store: Arc<dyn IdentityStore>,
    otp: Arc<dyn OtpDispatcher>,
    sensor: Arc<dyn BiometricSensor>,

    stage: CustomerStage,

    name: String,
    phone: String,
    phone_check: Verification<OtpEvidence>,
    fingerprint: Verification<CaptureEvidence>,
    face: Verification<CaptureEvidence>,

    customer_id: Option<CustomerId>,
    matched: Option<CustomerRecord>,
    recovery: Option<IdRecovery>,
    completed: Option<CustomerRecord>,
}

impl CustomerEnrollment {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        otp: Arc<dyn OtpDispatcher>,
        sensor: Arc<dyn BiometricSensor>,
    ) -> Self {
        Self {
            store,
            otp,
            sensor,
            stage: CustomerStage::Collect,
            name: String::new(),
            phone: String::new(),
            phone_check: Verification::Unverified,
            fingerprint: Verification::Unverified,
            face: Verification::Unverified,
            customer_id: None,
            matched: None,
            recovery: None,
            completed: None,
        }
    }

    pub fn stage(&self) -> CustomerStage {
        self.stage
    }

    pub fn matched(&self) -> Option<&CustomerRecord> {
        self.matched.as_ref()
    }

    pub fn completed(&self) -> Option<&CustomerRecord> {
        self.completed.as_ref()
    }

    pub fn phone_verified(&self) -> bool {
        self.phone_check.is_verified()
    }

    pub fn fingerprint_verified(&self) -> bool {
        self.fingerprint.is_verified()
    }

    pub fn face_verified(&self) -> bool {
        self.face.is_verified()
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), EnrollError> {
        self.expect_collecting()?;
        self.name = name.trim().to_string();
        Ok(())
    }

    pub fn set_phone(&mut self, value: &str) -> Result<(), EnrollError> {
        self.expect_collecting()?;
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(PHONE_LEN)
            .collect();
        if normalized != self.phone {
            self.phone = normalized;
            self.phone_check.reset();
        }
        Ok(())
    }

    /// Dispatch and confirm the phone OTP.
    pub async fn verify_phone(&mut self) -> Result<OtpEvidence, EnrollError> {
        self.expect_collecting()?;
        if self.phone.len() != PHONE_LEN {
            return Err(EnrollError::Incomplete(
                "a 10-digit phone number is required before verification",
            ));
        }
        self.phone_check = Verification::Pending;
        let evidence = self.otp.dispatch(&self.phone).await?;
        self.phone_check = Verification::Verified(evidence.clone());
        self.refresh_match().await?;
        Ok(evidence)
    }

    pub async fn capture_fingerprint(&mut self) -> Result<(), EnrollError> {
        self.expect_collecting()?;
        self.fingerprint = Verification::Pending;
        let evidence = self.sensor.capture_fingerprint(&self.phone).await?;
        self.fingerprint = Verification::Verified(evidence);
        self.refresh_match().await?;
        Ok(())
    }

    /// Capture the face scan; a denied camera degrades to capturing without
    /// a live preview.
    pub async fn capture_face(&mut self) -> Result<(), EnrollError> {
        self.expect_collecting()?;
        self.face = Verification::Pending;

        let camera_acquired = match self.sensor.acquire_camera().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("camera access denied, continuing without preview: {err}");
                false
            }
        };

        let result = self.sensor.capture_face(&self.phone).await;
        if camera_acquired {
            self.sensor.release_camera();
        }

        self.face = Verification::Verified(result?);
        self.refresh_match().await?;
        Ok(())
    }

    pub fn registration_complete(&self) -> bool {
        !self.name.is_empty()
            && self.phone_check.is_verified()
            && self.fingerprint.is_verified()
            && self.face.is_verified()
    }

    /// Mint the customer identifier and append the new record.
    ///
    /// Blocked while an existing identity matches the collected evidence;
    /// the user signs in with their ID instead. The identifier is generated
    /// exactly once per enrollment.
    pub async fn register(&mut self) -> Result<CustomerRecord, EnrollError> {
        self.expect_collecting()?;
        if self.matched.is_some() {
            return Err(EnrollError::IdentityMatched);
        }
        if !self.registration_complete() {
            return Err(EnrollError::Incomplete(
                "name, verified phone, fingerprint and face scan are required",
            ));
        }

        if self.customer_id.is_none() {
            self.customer_id = Some(generate_customer_id());
        }
        let customer_id = self
            .customer_id
            .clone()
            .ok_or(EnrollError::WrongStage)?;

        let record = CustomerRecord {
            name: self.name.clone(),
            phone: self.phone.clone(),
            fingerprint_verified: self.fingerprint.is_verified(),
            face_verified: self.face.is_verified(),
            customer_id,
            fingerprint_hash: self.fingerprint.evidence().map(|e| e.hash.clone()),
            face_hash: self.face.evidence().map(|e| e.hash.clone()),
        };

        self.store.add_customer(record.clone()).await?;
        self.completed = Some(record.clone());
        self.stage = CustomerStage::Complete;
        Ok(record)
    }

    /// Sign in with the matched record's identifier instead of registering.
    pub fn sign_in(&mut self, claimed_id: &str) -> Result<CustomerRecord, EnrollError> {
        self.expect_collecting()?;
        let matched = self.matched.as_ref().ok_or(EnrollError::NoMatch)?;
        if matched.has_id(claimed_id) {
            let record = matched.clone();
            self.completed = Some(record.clone());
            self.stage = CustomerStage::Complete;
            Ok(record)
        } else {
            Err(EnrollError::IdMismatch)
        }
    }

    // ---- Forgot-ID recovery -------------------------------------------

    /// Enter the recovery sub-flow. Only available from the idle sign-in
    /// prompt, which requires a matched identity.
    pub fn begin_recovery(&mut self) -> Result<(), EnrollError> {
        self.expect_collecting()?;
        if self.matched.is_none() {
            return Err(EnrollError::NoMatch);
        }
        self.recovery = Some(IdRecovery::new(self.otp.clone()));
        Ok(())
    }

    /// Dispatch the recovery code and return it (surfaced directly in the
    /// prototype).
    pub async fn recovery_request_code(
        &mut self,
        phone: &str,
    ) -> Result<OtpEvidence, EnrollError> {
        let recovery = self.recovery.as_mut().ok_or(EnrollError::WrongStage)?;
        recovery.request_code(phone).await
    }

    /// Confirm the recovery code; on success, reveal the matched record's
    /// primary identifier.
    pub fn recovery_confirm(&mut self, code: &str) -> Result<CustomerId, EnrollError> {
        let recovery = self.recovery.as_mut().ok_or(EnrollError::WrongStage)?;
        recovery.confirm(code)?;
        let matched = self.matched.as_ref().ok_or(EnrollError::NoMatch)?;
        Ok(matched.customer_id.clone())
    }

    async fn refresh_match(&mut self) -> Result<(), EnrollError> {
        let evidence = CustomerEvidence {
            fingerprint: self.fingerprint.evidence().map(|e| e.hash.clone()),
            face: self.face.evidence().map(|e| e.hash.clone()),
        };
        if let Some(found) = self.store.find_customer_by_identity(&evidence).await? {
            self.matched = Some(found);
        }
        Ok(())
    }

    fn expect_collecting(&self) -> Result<(), EnrollError> {
        if self.stage == CustomerStage::Collect {
            Ok(())
        } else {
            Err(EnrollError::WrongStage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{
        SimulatedOtpDispatcher, SimulatedSensor, DEMO_SEED_FACE, DEMO_SEED_FINGERPRINT,
        DEMO_SEED_PHONE,
    };
    use bharosa_core::BiometricHash;
    use bharosa_registry::InMemoryRegistry;
    use std::time::Duration;

    async fn seeded_store() -> Arc<InMemoryRegistry> {
        let store = Arc::new(InMemoryRegistry::new());
        store
            .add_customer(CustomerRecord {
                name: "Conference Carl".to_string(),
                phone: DEMO_SEED_PHONE.to_string(),
                fingerprint_verified: true,
                face_verified: true,
                customer_id: CustomerId::new("BH-CUST-PROTOTYPE"),
                fingerprint_hash: Some(BiometricHash::new(DEMO_SEED_FINGERPRINT)),
                face_hash: Some(BiometricHash::new(DEMO_SEED_FACE)),
            })
            .await
            .unwrap();
        store
    }

    fn enrollment(store: Arc<InMemoryRegistry>) -> CustomerEnrollment {
        CustomerEnrollment::new(
            store,
            Arc::new(SimulatedOtpDispatcher::new(Duration::ZERO)),
            Arc::new(SimulatedSensor::new(Duration::ZERO)),
        )
    }

    #[tokio::test]
    async fn test_registration_gate() {
        let mut flow = enrollment(Arc::new(InMemoryRegistry::new()));
        flow.set_name("Asha Rao").unwrap();
        flow.set_phone("9111111111").unwrap();

        assert!(!flow.registration_complete());
        assert!(matches!(
            flow.register().await,
            Err(EnrollError::Incomplete(_))
        ));

        flow.verify_phone().await.unwrap();
        flow.capture_fingerprint().await.unwrap();
        flow.capture_face().await.unwrap();
        assert!(flow.registration_complete());

        let record = flow.register().await.unwrap();
        assert!(record.customer_id.as_str().starts_with("BH-CUST-"));
        assert_eq!(flow.stage(), CustomerStage::Complete);
    }

    #[tokio::test]
    async fn test_seeded_phone_is_diverted_before_issuance() {
        let store = seeded_store().await;
        let mut flow = enrollment(store);
        flow.set_name("Conference Carl").unwrap();
        flow.set_phone(DEMO_SEED_PHONE).unwrap();
        flow.verify_phone().await.unwrap();
        flow.capture_fingerprint().await.unwrap();

        // The seeded capture hash matches the registered record mid-flow.
        assert!(flow.matched().is_some());

        flow.capture_face().await.unwrap();
        assert!(matches!(
            flow.register().await,
            Err(EnrollError::IdentityMatched)
        ));

        let record = flow.sign_in("BH-CUST-PROTOTYPE").unwrap();
        assert_eq!(record.customer_id.as_str(), "BH-CUST-PROTOTYPE");
    }

    #[tokio::test]
    async fn test_sign_in_mismatch_keeps_flow_open() {
        let store = seeded_store().await;
        let mut flow = enrollment(store);
        flow.set_phone(DEMO_SEED_PHONE).unwrap();
        flow.capture_fingerprint().await.unwrap();
        assert!(flow.matched().is_some());

        assert!(matches!(
            flow.sign_in("BH-CUST-WRONG"),
            Err(EnrollError::IdMismatch)
        ));
        // No lockout: the next attempt with the right ID still works.
        assert!(flow.sign_in("BH-CUST-PROTOTYPE").is_ok());
    }

    #[tokio::test]
    async fn test_recovery_reveals_matched_id() {
        let store = seeded_store().await;
        let mut flow = enrollment(store);
        flow.set_phone(DEMO_SEED_PHONE).unwrap();
        flow.capture_fingerprint().await.unwrap();

        flow.begin_recovery().unwrap();
        let sent = flow.recovery_request_code(DEMO_SEED_PHONE).await.unwrap();

        assert!(matches!(
            flow.recovery_confirm("000000"),
            Err(EnrollError::RecoveryCodeMismatch)
        ));
        let revealed = flow.recovery_confirm(&sent.code).unwrap();
        assert_eq!(revealed.as_str(), "BH-CUST-PROTOTYPE");
    }

    #[tokio::test]
    async fn test_recovery_requires_match() {
        let mut flow = enrollment(Arc::new(InMemoryRegistry::new()));
        assert!(matches!(flow.begin_recovery(), Err(EnrollError::NoMatch)));
    }
}
