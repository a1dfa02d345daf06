//! HTTP route handlers for enrollment flows
//!
//! Each in-progress enrollment is addressed by a handle and driven one
//! event at a time: field updates, verification triggers, step advances,
//! credential issuance, the sign-in divert and the recovery sub-flow.
//! Closed gates come back as conflict responses the client renders inline;
//! nothing here is terminal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use bharosa_core::IncomeBracket;
use bharosa_enroll::EnrollError;

use crate::routes::{api_error, not_found, ApiError};
use crate::state::{AppState, Enrollment};

fn enroll_error(err: EnrollError) -> ApiError {
    let status = match &err {
        EnrollError::IdMismatch | EnrollError::RecoveryCodeMismatch => StatusCode::FORBIDDEN,
        EnrollError::Verify(_) => StatusCode::BAD_GATEWAY,
        EnrollError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::CONFLICT,
    };
    let code = match &err {
        EnrollError::Incomplete(_) => "gate_closed",
        EnrollError::WrongStage => "wrong_step",
        EnrollError::ReverificationRequired => "reverification_required",
        EnrollError::IdentityMatched => "identity_matched",
        EnrollError::IdMismatch => "id_mismatch",
        EnrollError::NoMatch => "no_match",
        EnrollError::RecoveryCodeMismatch => "recovery_code_mismatch",
        EnrollError::Verify(_) => "verification_unavailable",
        EnrollError::Registry(_) => "storage_error",
    };
    api_error(status, code, err.to_string())
}

fn snapshot(id: &Uuid, enrollment: &Enrollment) -> Value {
    match enrollment {
        Enrollment::Customer(flow) => json!({
            "enrollment_id": id,
            "kind": "customer",
            "stage": flow.stage(),
            "phone_verified": flow.phone_verified(),
            "fingerprint_verified": flow.fingerprint_verified(),
            "face_verified": flow.face_verified(),
            "registration_complete": flow.registration_complete(),
            "identity_matched": flow.matched().is_some(),
        }),
        Enrollment::Merchant(flow) => json!({
            "enrollment_id": id,
            "kind": "merchant",
            "stage": flow.stage(),
            "government_id_verified": flow.government_id_verified(),
            "phone_verified": flow.phone_verified(),
            "fingerprint_verified": flow.fingerprint_verified(),
            "face_verified": flow.face_verified(),
            "location_confirmed": flow.location_confirmed(),
            "primary_complete": flow.primary_complete(),
            "detail_complete": flow.detail_complete(),
            "needs_reverification": flow.needs_reverification(),
            "identity_matched": flow.matched().is_some(),
            "review": flow.review_display().map(|(government_id, tax_id)| json!({
                "government_id": government_id,
                "tax_id": tax_id,
            })),
            "credentials": flow.credentials().map(|(merchant_id, reference)| json!({
                "merchant_id": merchant_id,
                "reference": reference,
            })),
        }),
    }
}

/// Open a customer enrollment
pub async fn open_customer(State(state): State<AppState>) -> Json<Value> {
    let id = state.open_customer_enrollment().await;
    Json(json!({ "enrollment_id": id }))
}

/// Open a merchant enrollment
pub async fn open_merchant(State(state): State<AppState>) -> Json<Value> {
    let id = state.open_merchant_enrollment().await;
    Json(json!({ "enrollment_id": id }))
}

/// Current enrollment state
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let enrollments = state.enrollments.read().await;
    let enrollment = enrollments
        .get(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;
    Ok(Json(snapshot(&id, enrollment)))
}

/// Cancel an enrollment, discarding in-progress local state.
pub async fn cancel_enrollment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if state.discard_enrollment(&id).await {
        Ok(Json(json!({ "cancelled": true })))
    } else {
        Err(not_found("no such enrollment"))
    }
}

#[derive(Debug, Deserialize)]
pub struct PrimaryFields {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub government_id: Option<String>,
    pub phone: Option<String>,
}

/// Update primary-step fields
pub async fn update_primary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(fields): Json<PrimaryFields>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    match enrollment {
        Enrollment::Customer(flow) => {
            if let Some(name) = &fields.name {
                flow.set_name(name).map_err(enroll_error)?;
            }
            if let Some(phone) = &fields.phone {
                flow.set_phone(phone).map_err(enroll_error)?;
            }
        }
        Enrollment::Merchant(flow) => {
            if let Some(owner_name) = &fields.owner_name {
                flow.set_owner_name(owner_name).map_err(enroll_error)?;
            }
            if let Some(government_id) = &fields.government_id {
                flow.set_government_id(government_id).map_err(enroll_error)?;
            }
            if let Some(phone) = &fields.phone {
                flow.set_phone(phone).map_err(enroll_error)?;
            }
        }
    }

    Ok(Json(snapshot(&id, enrollment)))
}

/// Dispatch and confirm the phone OTP; the code is surfaced directly (a
/// prototype artifact).
pub async fn verify_phone(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let evidence = match enrollment {
        Enrollment::Customer(flow) => flow.verify_phone().await,
        Enrollment::Merchant(flow) => flow.verify_phone().await,
    }
    .map_err(enroll_error)?;

    Ok(Json(json!({
        "code": evidence.code,
        "verified_at": evidence.verified_at,
        "state": snapshot(&id, enrollment),
    })))
}

/// Dispatch and confirm the government-ID OTP (merchant flows)
pub async fn verify_government_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    let evidence = flow.verify_government_id().await.map_err(enroll_error)?;

    Ok(Json(json!({
        "code": evidence.code,
        "verified_at": evidence.verified_at,
        "state": snapshot(&id, enrollment),
    })))
}

/// Advance a merchant flow from primary collection to detail collection
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    flow.advance_to_detail().map_err(enroll_error)?;

    Ok(Json(snapshot(&id, enrollment)))
}

#[derive(Debug, Deserialize)]
pub struct DetailFields {
    pub legal_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub tax_id: Option<String>,
    pub income: Option<String>,
}

/// Update detail-step fields (merchant flows)
pub async fn update_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(fields): Json<DetailFields>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };

    if let Some(legal_name) = &fields.legal_name {
        flow.set_legal_name(legal_name).map_err(enroll_error)?;
    }
    if let Some(date_of_birth) = &fields.date_of_birth {
        let date = NaiveDate::parse_from_str(date_of_birth, "%Y-%m-%d").map_err(|_| {
            api_error(
                StatusCode::BAD_REQUEST,
                "invalid_date",
                "date_of_birth must be YYYY-MM-DD",
            )
        })?;
        flow.set_date_of_birth(date).map_err(enroll_error)?;
    }
    if let Some(tax_id) = &fields.tax_id {
        flow.set_tax_id(tax_id).await.map_err(enroll_error)?;
    }
    if let Some(income) = &fields.income {
        let bracket = IncomeBracket::from_str(income).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                "invalid_income_bracket",
                "income must be one of 0-2, 2-6, 6-8, 8+",
            )
        })?;
        flow.set_income(bracket).map_err(enroll_error)?;
    }

    Ok(Json(snapshot(&id, enrollment)))
}

/// Capture the fingerprint scan
pub async fn capture_fingerprint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    match enrollment {
        Enrollment::Customer(flow) => flow.capture_fingerprint().await,
        Enrollment::Merchant(flow) => flow.capture_fingerprint().await,
    }
    .map_err(enroll_error)?;

    Ok(Json(snapshot(&id, enrollment)))
}

/// Capture the face scan (camera denial degrades, never fails)
pub async fn capture_face(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    match enrollment {
        Enrollment::Customer(flow) => flow.capture_face().await,
        Enrollment::Merchant(flow) => flow.capture_face().await,
    }
    .map_err(enroll_error)?;

    Ok(Json(snapshot(&id, enrollment)))
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub address: String,
}

/// Confirm the business location (merchant flows)
pub async fn confirm_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    flow.confirm_location(&request.address).map_err(enroll_error)?;

    Ok(Json(snapshot(&id, enrollment)))
}

/// Enter the review step, snapshotting the government identifiers
pub async fn begin_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    flow.begin_review().map_err(enroll_error)?;

    Ok(Json(snapshot(&id, enrollment)))
}

#[derive(Debug, Deserialize)]
pub struct ReviewFields {
    pub government_id: Option<String>,
    pub tax_id: Option<String>,
}

/// Edit the reviewed identifier copies; a change away from the snapshot
/// arms mandatory re-verification.
pub async fn edit_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(fields): Json<ReviewFields>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    if let Some(government_id) = &fields.government_id {
        flow.edit_review_government_id(government_id)
            .map_err(enroll_error)?;
    }
    if let Some(tax_id) = &fields.tax_id {
        flow.edit_review_tax_id(tax_id).map_err(enroll_error)?;
    }

    Ok(Json(snapshot(&id, enrollment)))
}

/// Run the fresh OTP verification required after a review edit
pub async fn reverify(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    let evidence = flow.reverify().await.map_err(enroll_error)?;

    Ok(Json(json!({
        "code": evidence.code,
        "verified_at": evidence.verified_at,
        "state": snapshot(&id, enrollment),
    })))
}

/// Issue the final identifiers (exactly once per enrollment)
pub async fn issue_credentials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Merchant(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    let (merchant_id, reference) = flow.issue_credentials().map_err(enroll_error)?;

    Ok(Json(json!({
        "merchant_id": merchant_id,
        "reference": reference,
        "state": snapshot(&id, enrollment),
    })))
}

/// Finalize the registration: append the record and open a session
pub async fn finalize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    match enrollment {
        Enrollment::Customer(flow) => {
            let record = flow.register().await.map_err(enroll_error)?;
            let session_id = state.create_customer_session(record.clone()).await;
            Ok(Json(json!({
                "session_id": session_id,
                "customer": record,
            })))
        }
        Enrollment::Merchant(flow) => {
            let record = flow.finalize().await.map_err(enroll_error)?;
            let session_id = state.create_merchant_session(record.clone()).await;
            Ok(Json(json!({
                "session_id": session_id,
                "merchant": record,
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub claimed_id: String,
}

/// Sign in with the matched record's identifier instead of registering a
/// duplicate. Mismatches are retryable with no lockout.
pub async fn sign_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    match enrollment {
        Enrollment::Customer(flow) => {
            let record = flow.sign_in(&request.claimed_id).map_err(enroll_error)?;
            let session_id = state.create_customer_session(record.clone()).await;
            Ok(Json(json!({
                "session_id": session_id,
                "customer": record,
            })))
        }
        Enrollment::Merchant(flow) => {
            let record = flow.sign_in(&request.claimed_id).map_err(enroll_error)?;
            let session_id = state.create_merchant_session(record.clone()).await;
            Ok(Json(json!({
                "session_id": session_id,
                "merchant": record,
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    pub phone: String,
}

/// Start the forgot-ID recovery sub-flow and dispatch the code
pub async fn recovery_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecoveryRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Customer(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    flow.begin_recovery().map_err(enroll_error)?;
    let evidence = flow
        .recovery_request_code(&request.phone)
        .await
        .map_err(enroll_error)?;

    Ok(Json(json!({ "code": evidence.code })))
}

#[derive(Debug, Deserialize)]
pub struct RecoveryConfirmRequest {
    pub code: String,
}

/// Confirm the recovery code and reveal the matched record's identifier
pub async fn recovery_confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecoveryConfirmRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut enrollments = state.enrollments.write().await;
    let enrollment = enrollments
        .get_mut(&id)
        .ok_or_else(|| not_found("no such enrollment"))?;

    let Enrollment::Customer(flow) = enrollment else {
        return Err(enroll_error(EnrollError::WrongStage));
    };
    let customer_id = flow.recovery_confirm(&request.code).map_err(enroll_error)?;

    Ok(Json(json!({ "customer_id": customer_id })))
}
