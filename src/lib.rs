//! SAML 2.0 assertion validation and trust confirmation.
//!
//! This crate decides whether an already-parsed SAML assertion is
//! cryptographically trustworthy, temporally valid, intended for this
//! recipient, and not a replay. It provides:
//!
//! - **Validator chain** - ordered signature, condition, and subject
//!   confirmation phases producing a single tri-state verdict
//! - **Trust resolution** - criteria-based narrowing of a shared credential
//!   pool before signature verification
//! - **Replay prevention** - a concurrency-safe cache for one-time-use
//!   assertions
//! - **Per-call context** - named static/dynamic parameters plus ordered
//!   failure diagnostics
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`types`] - the assertion object model the engine consumes
//! - [`context`] - the per-validation parameter and result bag
//! - [`validators`] - condition/confirmation validators and the orchestrator
//! - [`trust`] - credentials, criteria sets, and the trust resolver
//! - [`verify`] - the delegated signature verification primitive
//! - [`replay`] - the anti-replay store
//! - [`clock`] - substitutable time source
//! - [`error`] - error taxonomy
//!
//! XML parsing, canonicalization, wire bindings, and metadata discovery are
//! external collaborators: the engine consumes their output and hands back a
//! verdict.
//!
//! # Example
//!
//! ```rust,ignore
//! use saml_assertion_validation::{
//!     AssertionValidator, CredentialPool, ReplayCache, SignatureTrustResolver,
//!     ValidationContext, AwsLcVerifier,
//! };
//!
//! let trust = SignatureTrustResolver::new(pool, std::sync::Arc::new(AwsLcVerifier));
//! let validator = AssertionValidator::with_defaults(trust, replay_cache);
//! let verdict = validator.validate(&assertion, &mut context);
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Profiles](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod context;
pub mod error;
pub mod replay;
pub mod trust;
pub mod types;
pub mod validators;
pub mod verify;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{params, ParamValue, ValidationContext};
pub use error::{ReplayError, TrustError, ValidationError, VerifyError};
pub use replay::ReplayCache;
pub use trust::{Credential, CredentialPool, CredentialUsage, CriteriaSet, Criterion, SignatureTrustResolver};
pub use types::*;
pub use validators::{AssertionValidator, ValidationOutcome, Verdict};
pub use verify::{AwsLcVerifier, SignatureVerifier};
