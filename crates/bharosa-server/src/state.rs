//! Application state

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use bharosa_advisor::{AdvisorClient, AdvisorConfig};
use bharosa_core::{CustomerRecord, MerchantRecord};
use bharosa_enroll::verify::{BiometricSensor, OtpDispatcher};
use bharosa_enroll::{
    CustomerEnrollment, MerchantEnrollment, SimulatedOtpDispatcher, SimulatedSensor,
};
use bharosa_registry::InMemoryRegistry;
use bharosa_reputation::{LoanOffer, ReputationLedger};

use crate::seeds::SeedData;

/// An in-progress enrollment flow, driven over HTTP one event at a time.
pub enum Enrollment {
    Customer(CustomerEnrollment),
    Merchant(MerchantEnrollment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionRole {
    Customer,
    Merchant,
}

/// An authenticated session: the registration record plus the registered
/// flag. Created only after a successful finalize or identity-match
/// sign-in; destroyed on logout; never persisted.
#[derive(Clone, Serialize)]
pub struct NetworkSession {
    pub role: SessionRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<MerchantRecord>,
    pub is_registered: bool,
    pub created_at: DateTime<Utc>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Identity registry (in production, a transactional database)
    pub registry: Arc<InMemoryRegistry>,

    /// Reputation ledger
    pub ledger: Arc<ReputationLedger>,

    /// Best-effort advisory client
    pub advisor: Arc<AdvisorClient>,

    /// OTP dispatch collaborator
    pub otp: Arc<dyn OtpDispatcher>,

    /// Biometric sensor collaborator
    pub sensor: Arc<dyn BiometricSensor>,

    /// Standing bank offers
    pub offers: Arc<Vec<LoanOffer>>,

    /// Seed data, re-exposed at /demo/seeds
    pub seeds: Arc<SeedData>,

    /// In-progress enrollments
    pub enrollments: Arc<RwLock<HashMap<Uuid, Enrollment>>>,

    /// Active sessions
    pub sessions: Arc<RwLock<HashMap<Uuid, NetworkSession>>>,
}

impl AppState {
    /// Build state with the default simulated collaborators and seed data.
    pub async fn new(advisor: AdvisorConfig, simulated_delay: Duration) -> anyhow::Result<Self> {
        Self::with_collaborators(
            advisor,
            Arc::new(SimulatedOtpDispatcher::new(simulated_delay)),
            Arc::new(SimulatedSensor::new(simulated_delay)),
        )
        .await
    }

    /// Build state with explicit collaborators (tests pass zero-delay ones).
    pub async fn with_collaborators(
        advisor: AdvisorConfig,
        otp: Arc<dyn OtpDispatcher>,
        sensor: Arc<dyn BiometricSensor>,
    ) -> anyhow::Result<Self> {
        let registry = Arc::new(InMemoryRegistry::new());
        let ledger = Arc::new(ReputationLedger::new());

        let seeds = SeedData::generate();
        seeds.apply(&registry, &ledger).await?;

        Ok(Self {
            offers: Arc::new(seeds.offers.clone()),
            seeds: Arc::new(seeds),
            registry,
            ledger,
            advisor: Arc::new(AdvisorClient::new(advisor)),
            otp,
            sensor,
            enrollments: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Open a fresh customer enrollment and return its handle.
    pub async fn open_customer_enrollment(&self) -> Uuid {
        let flow = CustomerEnrollment::new(
            self.registry.clone(),
            self.otp.clone(),
            self.sensor.clone(),
        );
        self.insert_enrollment(Enrollment::Customer(flow)).await
    }

    /// Open a fresh merchant enrollment and return its handle.
    pub async fn open_merchant_enrollment(&self) -> Uuid {
        let flow = MerchantEnrollment::new(
            self.registry.clone(),
            self.otp.clone(),
            self.sensor.clone(),
        );
        self.insert_enrollment(Enrollment::Merchant(flow)).await
    }

    async fn insert_enrollment(&self, enrollment: Enrollment) -> Uuid {
        let id = Uuid::new_v4();
        let mut enrollments = self.enrollments.write().await;
        enrollments.insert(id, enrollment);
        id
    }

    /// Discard an in-progress enrollment (cancel). Any in-flight simulated
    /// operation dies with the flow.
    pub async fn discard_enrollment(&self, id: &Uuid) -> bool {
        let mut enrollments = self.enrollments.write().await;
        enrollments.remove(id).is_some()
    }

    pub async fn create_customer_session(&self, record: CustomerRecord) -> Uuid {
        self.create_session(NetworkSession {
            role: SessionRole::Customer,
            customer: Some(record),
            merchant: None,
            is_registered: true,
            created_at: Utc::now(),
        })
        .await
    }

    pub async fn create_merchant_session(&self, record: MerchantRecord) -> Uuid {
        self.create_session(NetworkSession {
            role: SessionRole::Merchant,
            customer: None,
            merchant: Some(record),
            is_registered: true,
            created_at: Utc::now(),
        })
        .await
    }

    async fn create_session(&self, session: NetworkSession) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session);
        id
    }

    /// Tear down a session on logout. Nothing survives it.
    pub async fn destroy_session(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }
}
