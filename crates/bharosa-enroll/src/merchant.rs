//! Merchant registration flow
//!
//! A four-step wizard: collect the primary identity (owner name,
//! government ID, phone, both OTP-confirmed), collect business detail
//! (legal name, date of birth, tax ID, biometrics, location, income),
//! review the government identifiers, then issue credentials. Each
//! transition is gated on the step's required fields and verifications.
//!
//! Whenever a new verification signal lands, the identity matcher is
//! consulted; a match blocks duplicate registration and opens the
//! sign-in-by-ID path instead.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use bharosa_core::identity::mask_government_id;
use bharosa_core::{
    CaptureEvidence, IncomeBracket, LocationEvidence, MerchantId, MerchantRecord, MerchantRef,
    OtpEvidence, Verification, GOVERNMENT_ID_LEN, PHONE_LEN, TAX_ID_LEN, TAX_ID_MIN_LEN,
};
use bharosa_registry::{IdentityStore, MerchantEvidence};

use crate::credential::generate_merchant_credentials;
use crate::verify::{BiometricSensor, OtpDispatcher};
use crate::EnrollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantStage {
    CollectPrimary,
    CollectDetail,
    Review,
    CredentialIssuance,
    Complete,
}

/// Review-step state: a frozen snapshot of the government identifiers plus
/// the editable copies shown back to the user.
#[derive(Debug, Clone)]
struct ReviewState {
    government_id_snapshot: String,
    tax_id_snapshot: String,
    government_id: String,
    tax_id: String,
    reverified: Verification<OtpEvidence>,
}

impl ReviewState {
    fn new(government_id: String, tax_id: String) -> Self {
        Self {
            government_id_snapshot: government_id.clone(),
            tax_id_snapshot: tax_id.clone(),
            government_id,
            tax_id,
            reverified: Verification::Unverified,
        }
    }

    fn edited(&self) -> bool {
        self.government_id != self.government_id_snapshot
            || self.tax_id != self.tax_id_snapshot
    }

    fn needs_reverification(&self) -> bool {
        self.edited() && !self.reverified.is_verified()
    }
}

pub struct MerchantEnrollment {
    store: Arc<dyn IdentityStore>,
    otp: Arc<dyn OtpDispatcher>,
    sensor: Arc<dyn BiometricSensor>,

    stage: MerchantStage,

    owner_name: String,
    government_id: String,
    phone: String,
    government_id_check: Verification<OtpEvidence>,
    phone_check: Verification<OtpEvidence>,

    legal_name: String,
    date_of_birth: Option<NaiveDate>,
    tax_id: String,
    income: Option<IncomeBracket>,
    fingerprint: Verification<CaptureEvidence>,
    face: Verification<CaptureEvidence>,
    location: Verification<LocationEvidence>,

    review: Option<ReviewState>,
    credentials: Option<(MerchantId, MerchantRef)>,

    matched: Option<MerchantRecord>,
    completed: Option<MerchantRecord>,
}

impl MerchantEnrollment {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        otp: Arc<dyn OtpDispatcher>,
        sensor: Arc<dyn BiometricSensor>,
    ) -> Self {
        Self {
            store,
            otp,
            sensor,
            stage: MerchantStage::CollectPrimary,
            owner_name: String::new(),
            government_id: String::new(),
            phone: String::new(),
            government_id_check: Verification::Unverified,
            phone_check: Verification::Unverified,
            legal_name: String::new(),
            date_of_birth: None,
            tax_id: String::new(),
            income: None,
            fingerprint: Verification::Unverified,
            face: Verification::Unverified,
            location: Verification::Unverified,
            review: None,
            credentials: None,
            matched: None,
            completed: None,
        }
    }

    pub fn stage(&self) -> MerchantStage {
        self.stage
    }

    pub fn matched(&self) -> Option<&MerchantRecord> {
        self.matched.as_ref()
    }

    pub fn completed(&self) -> Option<&MerchantRecord> {
        self.completed.as_ref()
    }

    pub fn credentials(&self) -> Option<(&MerchantId, &MerchantRef)> {
        self.credentials.as_ref().map(|(id, r)| (id, r))
    }

    pub fn phone_verified(&self) -> bool {
        self.phone_check.is_verified()
    }

    pub fn government_id_verified(&self) -> bool {
        self.government_id_check.is_verified()
    }

    pub fn fingerprint_verified(&self) -> bool {
        self.fingerprint.is_verified()
    }

    pub fn face_verified(&self) -> bool {
        self.face.is_verified()
    }

    pub fn location_confirmed(&self) -> bool {
        self.location.is_verified()
    }

    // ---- Step 1: primary identity -------------------------------------

    pub fn set_owner_name(&mut self, name: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectPrimary)?;
        self.owner_name = name.trim().to_string();
        Ok(())
    }

    /// Set the government ID. Non-digits are stripped and the value is
    /// truncated to its exact length; a changed value drops any prior
    /// confirmation.
    pub fn set_government_id(&mut self, value: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectPrimary)?;
        let normalized = digits_only(value, GOVERNMENT_ID_LEN);
        if normalized != self.government_id {
            self.government_id = normalized;
            self.government_id_check.reset();
        }
        Ok(())
    }

    pub fn set_phone(&mut self, value: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectPrimary)?;
        let normalized = digits_only(value, PHONE_LEN);
        if normalized != self.phone {
            self.phone = normalized;
            self.phone_check.reset();
        }
        Ok(())
    }

    /// Dispatch and confirm the government-ID OTP.
    pub async fn verify_government_id(&mut self) -> Result<OtpEvidence, EnrollError> {
        self.expect_stage(MerchantStage::CollectPrimary)?;
        if self.government_id.len() != GOVERNMENT_ID_LEN {
            return Err(EnrollError::Incomplete(
                "a 12-digit government ID is required before verification",
            ));
        }
        self.government_id_check = Verification::Pending;
        let evidence = self.otp.dispatch(&self.government_id).await?;
        self.government_id_check = Verification::Verified(evidence.clone());
        self.refresh_match().await?;
        Ok(evidence)
    }

    /// Dispatch and confirm the phone OTP.
    pub async fn verify_phone(&mut self) -> Result<OtpEvidence, EnrollError> {
        self.expect_stage(MerchantStage::CollectPrimary)?;
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

    pub fn primary_complete(&self) -> bool {
        !self.owner_name.is_empty()
            && self.government_id.len() == GOVERNMENT_ID_LEN
            && self.phone.len() == PHONE_LEN
            && self.government_id_check.is_verified()
            && self.phone_check.is_verified()
    }

    pub fn advance_to_detail(&mut self) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectPrimary)?;
        if !self.primary_complete() {
            return Err(EnrollError::Incomplete(
                "owner name, a verified 12-digit government ID and a verified 10-digit phone are required",
            ));
        }
        self.stage = MerchantStage::CollectDetail;
        Ok(())
    }

    // ---- Step 2: business detail --------------------------------------

    pub fn set_legal_name(&mut self, name: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        self.legal_name = name.trim().to_string();
        Ok(())
    }

    pub fn set_date_of_birth(&mut self, date: NaiveDate) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        self.date_of_birth = Some(date);
        Ok(())
    }

    /// Set the tax ID (uppercased, truncated). A fully typed tax ID is an
    /// identity-match signal.
    pub async fn set_tax_id(&mut self, value: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(TAX_ID_LEN)
            .collect::<String>()
            .to_uppercase();
        self.tax_id = normalized;
        if self.tax_id.len() == TAX_ID_LEN {
            self.refresh_match().await?;
        }
        Ok(())
    }

    pub fn set_income(&mut self, income: IncomeBracket) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        self.income = Some(income);
        Ok(())
    }

    pub async fn capture_fingerprint(&mut self) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        self.fingerprint = Verification::Pending;
        let evidence = self.sensor.capture_fingerprint(&self.phone).await?;
        self.fingerprint = Verification::Verified(evidence);
        self.refresh_match().await?;
        Ok(())
    }

    /// Capture the face scan. A denied camera degrades the flow: the denial
    /// is logged and the capture proceeds without a live preview.
    pub async fn capture_face(&mut self) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
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

    pub fn confirm_location(&mut self, address: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        self.location = Verification::Verified(LocationEvidence {
            address: address.trim().to_string(),
            confirmed_at: Utc::now(),
        });
        Ok(())
    }

    pub fn detail_complete(&self) -> bool {
        !self.legal_name.is_empty()
            && self.date_of_birth.is_some()
            && self.tax_id.len() >= TAX_ID_MIN_LEN
            && self.fingerprint.is_verified()
            && self.face.is_verified()
            && self.location.is_verified()
            && self.income.is_some()
    }

    /// Enter the review step, snapshotting both government identifiers.
    pub fn begin_review(&mut self) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::CollectDetail)?;
        if !self.detail_complete() {
            return Err(EnrollError::Incomplete(
                "legal name, date of birth, tax ID, both biometrics, location and income are required",
            ));
        }
        self.review = Some(ReviewState::new(
            self.government_id.clone(),
            self.tax_id.clone(),
        ));
        self.stage = MerchantStage::Review;
        Ok(())
    }

    // ---- Step 3: review -----------------------------------------------

    pub fn edit_review_government_id(&mut self, value: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::Review)?;
        let review = self.review.as_mut().ok_or(EnrollError::WrongStage)?;
        review.government_id = digits_only(value, GOVERNMENT_ID_LEN);
        review.reverified.reset();
        Ok(())
    }

    pub fn edit_review_tax_id(&mut self, value: &str) -> Result<(), EnrollError> {
        self.expect_stage(MerchantStage::Review)?;
        let review = self.review.as_mut().ok_or(EnrollError::WrongStage)?;
        review.tax_id = value
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(TAX_ID_LEN)
            .collect::<String>()
            .to_uppercase();
        review.reverified.reset();
        Ok(())
    }

    pub fn needs_reverification(&self) -> bool {
        self.review
            .as_ref()
            .map(|r| r.needs_reverification())
            .unwrap_or(false)
    }

    /// Masked display values for the review step.
    pub fn review_display(&self) -> Option<(String, String)> {
        self.review
            .as_ref()
            .map(|r| (mask_government_id(&r.government_id), "X".repeat(TAX_ID_LEN)))
    }

    /// Run a fresh OTP verification for the changed identifier.
    pub async fn reverify(&mut self) -> Result<OtpEvidence, EnrollError> {
        self.expect_stage(MerchantStage::Review)?;
        let destination = {
            let review = self.review.as_ref().ok_or(EnrollError::WrongStage)?;
            if !review.edited() {
                return Err(EnrollError::Incomplete("no identity change to re-verify"));
            }
            if review.government_id != review.government_id_snapshot {
                review.government_id.clone()
            } else {
                review.tax_id.clone()
            }
        };

        if let Some(review) = self.review.as_mut() {
            review.reverified = Verification::Pending;
        }
        let evidence = self.otp.dispatch(&destination).await?;
        if let Some(review) = self.review.as_mut() {
            review.reverified = Verification::Verified(evidence.clone());
        }
        Ok(evidence)
    }

    // ---- Step 4: credential issuance ----------------------------------

    /// Generate the final identifiers, exactly once per enrollment. Repeat
    /// calls return the already-issued pair.
    pub fn issue_credentials(&mut self) -> Result<(MerchantId, MerchantRef), EnrollError> {
        match self.stage {
            MerchantStage::Review | MerchantStage::CredentialIssuance => {}
            _ => return Err(EnrollError::WrongStage),
        }
        if self.matched.is_some() {
            return Err(EnrollError::IdentityMatched);
        }
        if self.needs_reverification() {
            return Err(EnrollError::ReverificationRequired);
        }
        if self.credentials.is_none() {
            self.credentials = Some(generate_merchant_credentials());
        }
        self.stage = MerchantStage::CredentialIssuance;
        let (id, reference) = self
            .credentials
            .as_ref()
            .ok_or(EnrollError::WrongStage)?;
        Ok((id.clone(), reference.clone()))
    }

    /// Append the new identity to the registry and complete the flow.
    ///
    /// The record carries the reviewed identifier values, which at this
    /// point have passed mandatory re-verification if they were edited.
    pub async fn finalize(&mut self) -> Result<MerchantRecord, EnrollError> {
        self.expect_stage(MerchantStage::CredentialIssuance)?;
        if self.matched.is_some() {
            return Err(EnrollError::IdentityMatched);
        }

        let review = self.review.as_ref().ok_or(EnrollError::WrongStage)?;
        let (merchant_id, reference) =
            self.credentials.clone().ok_or(EnrollError::WrongStage)?;
        let date_of_birth = self
            .date_of_birth
            .ok_or(EnrollError::Incomplete("date of birth is required"))?;
        let income = self
            .income
            .ok_or(EnrollError::Incomplete("an income bracket is required"))?;

        let record = MerchantRecord {
            owner_name: self.owner_name.clone(),
            government_id: review.government_id.clone(),
            phone: self.phone.clone(),
            legal_name: self.legal_name.clone(),
            date_of_birth,
            tax_id: review.tax_id.clone(),
            income,
            location: self.location.evidence().map(|e| e.address.clone()),
            fingerprint_verified: self.fingerprint.is_verified(),
            face_verified: self.face.is_verified(),
            merchant_id,
            reference,
            fingerprint_hash: self.fingerprint.evidence().map(|e| e.hash.clone()),
            face_hash: self.face.evidence().map(|e| e.hash.clone()),
        };

        self.store.add_merchant(record.clone()).await?;
        self.completed = Some(record.clone());
        self.stage = MerchantStage::Complete;
        Ok(record)
    }

    // ---- Match side-channel -------------------------------------------

    /// Sign in with the claimed identifier of the matched record instead of
    /// registering a duplicate.
    pub fn sign_in(&mut self, claimed_id: &str) -> Result<MerchantRecord, EnrollError> {
        if self.stage == MerchantStage::Complete {
            return Err(EnrollError::WrongStage);
        }
        let matched = self.matched.as_ref().ok_or(EnrollError::NoMatch)?;
        if matched.has_id(claimed_id) {
            let record = matched.clone();
            self.completed = Some(record.clone());
            self.stage = MerchantStage::Complete;
            Ok(record)
        } else {
            Err(EnrollError::IdMismatch)
        }
    }

    /// Consult the identity matcher with every piece of evidence collected
    /// so far. Invoked after each verification signal, so a returning
    /// merchant is detected mid-flow.
    async fn refresh_match(&mut self) -> Result<(), EnrollError> {
        let evidence = MerchantEvidence {
            tax_id: (self.tax_id.len() == TAX_ID_LEN).then(|| self.tax_id.clone()),
            fingerprint: self.fingerprint.evidence().map(|e| e.hash.clone()),
            face: self.face.evidence().map(|e| e.hash.clone()),
        };
        if let Some(found) = self.store.find_merchant_by_identity(&evidence).await? {
            self.matched = Some(found);
        }
        Ok(())
    }

    fn expect_stage(&self, expected: MerchantStage) -> Result<(), EnrollError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(EnrollError::WrongStage)
        }
    }
}

fn digits_only(value: &str, max: usize) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(max)
        .collect()
}
