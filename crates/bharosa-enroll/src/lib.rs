//! Bharosa Enrollment
//!
//! Multi-step registration state machines for customers and merchants,
//! the verification collaborators they drive (OTP dispatch, biometric
//! capture), credential generation, and the forgot-ID recovery sub-flow.
//!
//! No step fails terminally: a closed gate is a typed error the caller
//! surfaces inline, and the flow stays where it is for retry.

pub mod credential;
pub mod customer;
pub mod merchant;
pub mod recovery;
pub mod verify;

use thiserror::Error;

pub use customer::{CustomerEnrollment, CustomerStage};
pub use merchant::{MerchantEnrollment, MerchantStage};
pub use recovery::IdRecovery;
pub use verify::{
    BiometricSensor, OtpDispatcher, SimulatedOtpDispatcher, SimulatedSensor, VerifyError,
};

#[derive(Error, Debug)]
pub enum EnrollError {
    /// A step gate is still closed; the message names what is missing.
    #[error("Step requirements not met: {0}")]
    Incomplete(&'static str),

    /// The operation does not belong to the flow's current step.
    #[error("Not available in the current step")]
    WrongStage,

    /// Identity details changed during review; a fresh verification is
    /// required before credentials can be issued.
    #[error("Mandatory re-verification required: identity details changed")]
    ReverificationRequired,

    /// A registered identity matched the supplied evidence; registration is
    /// diverted to the sign-in-by-ID path.
    #[error("An existing identity matched; sign in with your ID instead")]
    IdentityMatched,

    /// The claimed ID does not address the matched record. Retryable, no
    /// attempt limit.
    #[error("This ID does not belong to you. Try again.")]
    IdMismatch,

    /// Sign-in or recovery was requested without a matched identity.
    #[error("No matched identity to sign in with")]
    NoMatch,

    /// The recovery code did not match the dispatched one. Retryable.
    #[error("Invalid code. Recovery failed.")]
    RecoveryCodeMismatch,

    #[error(transparent)]
    Verify(#[from] verify::VerifyError),

    #[error(transparent)]
    Registry(#[from] bharosa_registry::RegistryError),
}
