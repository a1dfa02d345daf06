//! Test utilities for integration tests

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use bharosa_advisor::AdvisorConfig;
use bharosa_enroll::{SimulatedOtpDispatcher, SimulatedSensor};
use bharosa_server::state::AppState;

/// Test application wrapper
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Create a new test application with zero-delay collaborators and a
    /// disabled advisory endpoint.
    pub async fn new() -> Self {
        let state = AppState::with_collaborators(
            AdvisorConfig::disabled(),
            Arc::new(SimulatedOtpDispatcher::new(Duration::ZERO)),
            Arc::new(SimulatedSensor::new(Duration::ZERO)),
        )
        .await
        .expect("seed data applies");

        let router = bharosa_server::create_router(state);

        Self { router }
    }

    /// Get the router for making requests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Issue a JSON request and return `(status, parsed body)`.
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (u16, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                builder.body(Body::from(json.to_string())).unwrap()
            }
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status().as_u16();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        (status, value)
    }
}
