//! Validation error types.
//!
//! Errors here are recovered locally by the validators and translated into a
//! [`Verdict`](crate::validators::Verdict) plus a failure message on the
//! [`ValidationContext`](crate::context::ValidationContext). They never
//! escape a validation call as a fault.

use thiserror::Error;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while evaluating an assertion.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A mandatory context parameter is missing or empty.
    ///
    /// Surfaces as an INDETERMINATE verdict, never as a silent pass.
    #[error("missing required configuration: {0}")]
    Configuration(String),

    /// A signature was present but could not be trusted, or no trust
    /// candidate resolved for it.
    #[error("integrity failure: {0}")]
    Integrity(String),

    /// A time-window or replay constraint was violated.
    #[error("temporal constraint violated: {0}")]
    Temporal(String),

    /// Confirmation data did not match the configured recipients,
    /// addresses, or presenter key material.
    #[error("subject confirmation mismatch: {0}")]
    SubjectMismatch(String),
}

/// A replay key was seen again before its recorded expiration.
#[derive(Debug, Error)]
#[error("replay detected for key '{key}'")]
pub struct ReplayError {
    /// The duplicate replay key.
    pub key: String,
}

/// Signature trust resolution failures.
///
/// Both variants are INVALID to the caller but are logged differently:
/// [`TrustError::NoCandidates`] points at configuration or metadata,
/// [`TrustError::NotTrusted`] at tampering.
#[derive(Debug, Error)]
pub enum TrustError {
    /// No credential in the pool satisfied the criteria set.
    #[error("no trust candidates resolved for criteria")]
    NoCandidates,

    /// Candidates resolved, but none of them verified the signature.
    #[error("signature did not verify against any of {candidates} trust candidate(s)")]
    NotTrusted {
        /// Number of candidates that were tried.
        candidates: usize,
    },
}

/// Errors from the delegated cryptographic verification primitive.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The credential's key material could not be used.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// The signature algorithm is not supported by this verifier.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
