//! Verification collaborators
//!
//! OTP dispatch and biometric capture are external capabilities with a
//! narrow contract. The implementations here are simulations: a fixed delay
//! stands in for network/sensor latency, and the produced one-time codes and
//! hashes are surfaced directly (a prototype artifact, not for production
//! use). Because every operation is an `async fn` awaited by the owning
//! flow, dropping the flow cancels the in-flight operation — a discarded
//! flow can never observe a late result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use tokio::time::sleep;

use bharosa_core::{BiometricHash, CaptureEvidence, OtpEvidence};

/// Number of frames taken during a face capture before the camera is
/// released.
pub const FACE_CAPTURE_STEPS: usize = 3;

/// Phone number of the seeded demo identity. Captures for this number
/// reproduce the hashes of the pre-registered record, so the returning-user
/// divert can be exercised end to end.
pub const DEMO_SEED_PHONE: &str = "9876543210";
pub const DEMO_SEED_FINGERPRINT: &str = "fp-8888";
pub const DEMO_SEED_FACE: &str = "face-8888";

#[derive(Error, Debug)]
pub enum VerifyError {
    /// The device camera could not be acquired. Callers log this and
    /// continue in a degraded mode; it is never fatal to the flow.
    #[error("Camera capability unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Code dispatch failed: {0}")]
    DispatchFailed(String),
}

/// Dispatches one-time codes for phone and government-ID confirmation.
#[async_trait]
pub trait OtpDispatcher: Send + Sync {
    /// Dispatch a one-time code to the given destination and return it
    /// together with the completion timestamp.
    async fn dispatch(&self, destination: &str) -> Result<OtpEvidence, VerifyError>;
}

/// Captures biometric scans and manages the camera capability.
#[async_trait]
pub trait BiometricSensor: Send + Sync {
    /// Request the device camera. An error degrades the flow: the caller
    /// logs it and proceeds without a live preview.
    async fn acquire_camera(&self) -> Result<(), VerifyError>;

    /// Release the camera after the capture steps complete.
    fn release_camera(&self);

    async fn capture_fingerprint(&self, phone: &str) -> Result<CaptureEvidence, VerifyError>;

    async fn capture_face(&self, phone: &str) -> Result<CaptureEvidence, VerifyError>;
}

/// Simulated OTP dispatch: waits out the configured delay, then returns a
/// random 6-digit code.
pub struct SimulatedOtpDispatcher {
    delay: Duration,
}

impl SimulatedOtpDispatcher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl OtpDispatcher for SimulatedOtpDispatcher {
    async fn dispatch(&self, _destination: &str) -> Result<OtpEvidence, VerifyError> {
        sleep(self.delay).await;
        let code = {
            let mut rng = rand::thread_rng();
            rng.gen_range(100_000..1_000_000)
        };
        Ok(OtpEvidence {
            code: code.to_string(),
            verified_at: Utc::now(),
        })
    }
}

/// Simulated biometric sensor.
///
/// Known phone numbers map to fixed hashes (seeded identities); anything
/// else produces a fresh random hash per capture. The camera capability can
/// be marked unavailable to exercise the degraded path.
pub struct SimulatedSensor {
    delay: Duration,
    camera_available: AtomicBool,
    known: HashMap<String, (BiometricHash, BiometricHash)>,
}

impl SimulatedSensor {
    /// Create a sensor with the demo identity pre-seeded.
    pub fn new(delay: Duration) -> Self {
        let mut known = HashMap::new();
        known.insert(
            DEMO_SEED_PHONE.to_string(),
            (
                BiometricHash::new(DEMO_SEED_FINGERPRINT),
                BiometricHash::new(DEMO_SEED_FACE),
            ),
        );
        Self {
            delay,
            camera_available: AtomicBool::new(true),
            known,
        }
    }

    /// Seed an additional known identity.
    pub fn with_known_identity(
        mut self,
        phone: impl Into<String>,
        fingerprint: impl Into<String>,
        face: impl Into<String>,
    ) -> Self {
        self.known.insert(
            phone.into(),
            (
                BiometricHash::new(fingerprint.into()),
                BiometricHash::new(face.into()),
            ),
        );
        self
    }

    /// Mark the camera capability as denied.
    pub fn without_camera(self) -> Self {
        self.camera_available.store(false, Ordering::Relaxed);
        self
    }

    fn fingerprint_for(&self, phone: &str) -> BiometricHash {
        match self.known.get(phone) {
            Some((fingerprint, _)) => fingerprint.clone(),
            None => BiometricHash::new(format!("fp-{}", random_suffix())),
        }
    }

    fn face_for(&self, phone: &str) -> BiometricHash {
        match self.known.get(phone) {
            Some((_, face)) => face.clone(),
            None => BiometricHash::new(format!("face-{}", random_suffix())),
        }
    }
}

#[async_trait]
impl BiometricSensor for SimulatedSensor {
    async fn acquire_camera(&self) -> Result<(), VerifyError> {
        if self.camera_available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(VerifyError::CameraUnavailable(
                "camera access denied".to_string(),
            ))
        }
    }

    fn release_camera(&self) {}

    async fn capture_fingerprint(&self, phone: &str) -> Result<CaptureEvidence, VerifyError> {
        sleep(self.delay).await;
        Ok(CaptureEvidence {
            hash: self.fingerprint_for(phone),
            captured_at: Utc::now(),
        })
    }

    async fn capture_face(&self, phone: &str) -> Result<CaptureEvidence, VerifyError> {
        // One pause per capture frame.
        for _ in 0..FACE_CAPTURE_STEPS {
            sleep(self.delay).await;
        }
        Ok(CaptureEvidence {
            hash: self.face_for(phone),
            captured_at: Utc::now(),
        })
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
