//! HTTP route handlers for the network surface
//!
//! Merchant standings, ratings, offers, advisory copy and sessions.
//! Errors follow the `{error, error_description}` JSON convention.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use bharosa_core::{CustomerId, MerchantId, RatingValue};
use bharosa_reputation::{evaluate_offers, network_advice, LedgerError};

use crate::state::AppState;

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(
    status: StatusCode,
    error: &str,
    description: impl Into<String>,
) -> ApiError {
    (
        status,
        Json(json!({
            "error": error,
            "error_description": description.into(),
        })),
    )
}

pub(crate) fn not_found(what: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", what)
}

fn ledger_error(err: LedgerError) -> ApiError {
    match err {
        LedgerError::UnknownMerchant(id) => {
            not_found(format!("unknown merchant: {id}").as_str())
        }
        LedgerError::Storage(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e),
    }
}

/// Health check
pub async fn health() -> &'static str {
    "OK"
}

/// Demo/seed data endpoint
pub async fn seeds(State(state): State<AppState>) -> Json<Value> {
    Json(json!(&*state.seeds))
}

/// Merchant standing, with derived average, trust level and local advice
pub async fn get_merchant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let merchant_id = MerchantId::new(id);
    let standing = state
        .ledger
        .standing(&merchant_id)
        .map_err(ledger_error)?
        .ok_or_else(|| not_found("merchant not registered on the ledger"))?;

    let average = standing.average_rating();
    let advice = average.map(network_advice);

    Ok(Json(json!({
        "standing": standing,
        "average_rating": average,
        "trust_level": standing.trust_level(),
        "advice": advice,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rater: String,
    pub value: u8,
    pub comment: Option<String>,
}

/// Submit or edit a rating; the score adjustment and the rating record are
/// applied as one unit by the ledger.
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<Value>, ApiError> {
    let value = RatingValue::new(request.value).map_err(|err| {
        api_error(StatusCode::BAD_REQUEST, "invalid_rating", err.to_string())
    })?;

    let outcome = state
        .ledger
        .submit_rating(
            &CustomerId::new(request.rater),
            &MerchantId::new(id),
            value,
            request.comment.as_deref().unwrap_or(""),
        )
        .map_err(ledger_error)?;

    Ok(Json(json!(outcome)))
}

/// Bank offers priced against the merchant's current score
pub async fn merchant_offers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let standing = state
        .ledger
        .standing(&MerchantId::new(id))
        .map_err(ledger_error)?
        .ok_or_else(|| not_found("merchant not registered on the ledger"))?;

    let evaluated = evaluate_offers(standing.score, &state.offers);
    Ok(Json(json!({
        "score": standing.score,
        "offers": evaluated,
    })))
}

#[derive(Debug, Deserialize)]
pub struct InsightParams {
    pub role: Option<String>,
}

/// Advisory copy. Best-effort: a failed advisory call degrades to a static
/// fallback sentence and never blocks anything.
pub async fn insights(
    State(state): State<AppState>,
    Query(params): Query<InsightParams>,
) -> Result<Json<Value>, ApiError> {
    let role = params.role.unwrap_or_else(|| "CUSTOMER".to_string());

    let standings = state.ledger.standings().map_err(ledger_error)?;
    let activity: Vec<Value> = standings
        .iter()
        .map(|s| {
            json!({
                "merchant": s.name,
                "score": s.score,
                "average_rating": s.average_rating(),
            })
        })
        .collect();

    let insight = state
        .advisor
        .trust_insight(&role, &json!({ "recent": activity }))
        .await;

    Ok(Json(json!({ "role": role, "insight": insight })))
}

/// Current session, if any
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| not_found("no such session"))?;
    Ok(Json(json!(session)))
}

/// Logout: the session is destroyed and nothing survives it.
pub async fn logout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if state.destroy_session(&id).await {
        Ok(Json(json!({ "logged_out": true })))
    } else {
        Err(not_found("no such session"))
    }
}
