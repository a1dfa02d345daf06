//! Bharosa Server Library
//!
//! HTTP surface for the Bharosa trust network. The library exposes the
//! router and state for integration testing while the binary handles
//! startup.

pub mod enroll_routes;
pub mod middleware;
pub mod routes;
pub mod seeds;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build CORS layer based on environment.
///
/// - `BHAROSA_CORS_ORIGINS` — comma-separated allowed origins (default: `*`).
/// - When set to `*`, all origins are allowed (development mode).
/// - When set to specific origins, only those are allowed (production mode).
fn cors_layer() -> CorsLayer {
    let origins = std::env::var("BHAROSA_CORS_ORIGINS").unwrap_or_else(|_| "*".into());

    let allow_origin = if origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(std::time::Duration::from_secs(3600))
}

/// Enrollment sub-router: one in-progress flow per handle, driven event by
/// event.
fn enroll_router() -> Router<AppState> {
    Router::new()
        .route("/customer", post(enroll_routes::open_customer))
        .route("/merchant", post(enroll_routes::open_merchant))
        .route(
            "/:id",
            get(enroll_routes::get_enrollment).delete(enroll_routes::cancel_enrollment),
        )
        .route("/:id/primary", put(enroll_routes::update_primary))
        .route("/:id/verify/phone", post(enroll_routes::verify_phone))
        .route(
            "/:id/verify/government-id",
            post(enroll_routes::verify_government_id),
        )
        .route("/:id/advance", post(enroll_routes::advance))
        .route("/:id/detail", put(enroll_routes::update_detail))
        .route("/:id/fingerprint", post(enroll_routes::capture_fingerprint))
        .route("/:id/face", post(enroll_routes::capture_face))
        .route("/:id/location", post(enroll_routes::confirm_location))
        .route(
            "/:id/review",
            post(enroll_routes::begin_review).put(enroll_routes::edit_review),
        )
        .route("/:id/reverify", post(enroll_routes::reverify))
        .route("/:id/issue", post(enroll_routes::issue_credentials))
        .route("/:id/finalize", post(enroll_routes::finalize))
        .route("/:id/sign-in", post(enroll_routes::sign_in))
        .route("/:id/recovery", post(enroll_routes::recovery_start))
        .route(
            "/:id/recovery/confirm",
            post(enroll_routes::recovery_confirm),
        )
}

/// Core routes shared between dev and production routers.
fn core_routes() -> Router<AppState> {
    Router::new()
        // Enrollment flows
        .nest("/enroll", enroll_router())
        // Network surface
        .route("/merchants/:id", get(routes::get_merchant))
        .route("/merchants/:id/ratings", post(routes::submit_rating))
        .route("/merchants/:id/offers", get(routes::merchant_offers))
        .route("/insights", get(routes::insights))
        // Sessions
        .route("/sessions/:id", get(routes::get_session))
        .route("/sessions/:id/logout", post(routes::logout))
        // Health check
        .route("/health", get(routes::health))
        // Demo/seed data endpoints
        .route("/demo/seeds", get(routes::seeds))
}

/// Create the main router with all routes configured
pub fn create_router(state: AppState) -> Router {
    core_routes()
        .with_state(state)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
