//! Bharosa Advisor
//!
//! Thin client for an external generative-text service that turns recent
//! account activity into a sentence of concierge-style advisory copy.
//!
//! Strictly best-effort: any failure — no configured endpoint, network
//! error, malformed response — is logged and replaced with a static
//! fallback sentence. Callers never see an error, and no state transition
//! may depend on this service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fallback sentence substituted when the advisory service is unavailable.
pub const FALLBACK_INSIGHT: &str =
    "Our concierge is currently polishing your personalized reports. Please check back shortly.";

/// Instruction sent alongside every request.
const CONCIERGE_INSTRUCTION: &str =
    "You are the Concierge for Bharosa, a premium trust-based financial platform. \
     Provide an elite, professional financial insight in two sentences.";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Endpoint URL. `None` disables the client; every request returns the
    /// fallback immediately.
    pub endpoint: Option<String>,

    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl AdvisorConfig {
    /// Read `BHAROSA_ADVISOR_URL` and `BHAROSA_ADVISOR_KEY`.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("BHAROSA_ADVISOR_URL").ok(),
            api_key: std::env::var("BHAROSA_ADVISOR_KEY").ok(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A configuration with no endpoint; requests short-circuit to the
    /// fallback.
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct InsightRequest<'a> {
    instruction: &'static str,
    role: &'a str,
    activity: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    text: String,
}

/// Advisory client.
pub struct AdvisorClient {
    config: AdvisorConfig,
    client: reqwest::Client,
}

impl AdvisorClient {
    pub fn new(config: AdvisorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Fetch an advisory sentence for the given role and recent activity.
    ///
    /// Never fails: every error path resolves to [`FALLBACK_INSIGHT`].
    pub async fn trust_insight(&self, role: &str, activity: &serde_json::Value) -> String {
        let endpoint = match &self.config.endpoint {
            Some(endpoint) => endpoint,
            None => return FALLBACK_INSIGHT.to_string(),
        };

        match self.request_insight(endpoint, role, activity).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("advisory service returned empty copy, using fallback");
                FALLBACK_INSIGHT.to_string()
            }
            Err(err) => {
                tracing::warn!("advisory service unavailable, using fallback: {err}");
                FALLBACK_INSIGHT.to_string()
            }
        }
    }

    async fn request_insight(
        &self,
        endpoint: &str,
        role: &str,
        activity: &serde_json::Value,
    ) -> Result<String, reqwest::Error> {
        let mut request = self.client.post(endpoint).json(&InsightRequest {
            instruction: CONCIERGE_INSTRUCTION,
            role,
            activity,
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: InsightResponse = response.json().await?;
        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_returns_fallback() {
        let client = AdvisorClient::new(AdvisorConfig::disabled());
        let insight = client
            .trust_insight("CUSTOMER", &serde_json::json!([]))
            .await;
        assert_eq!(insight, FALLBACK_INSIGHT);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_returns_fallback() {
        let mut config = AdvisorConfig::with_endpoint("http://127.0.0.1:9/insight");
        config.timeout = Duration::from_millis(200);

        let client = AdvisorClient::new(config);
        let insight = client
            .trust_insight("SHOPKEEPER", &serde_json::json!({"recent": []}))
            .await;
        assert_eq!(insight, FALLBACK_INSIGHT);
    }
}
