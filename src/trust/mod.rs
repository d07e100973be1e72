//! Criteria-based credential and signature trust engine.
//!
//! A validation call narrows the shared credential pool with a
//! [`CriteriaSet`], then asks the [`SignatureTrustResolver`] to find a
//! candidate whose key material cryptographically verifies the signature.

mod credential;
mod criteria;
mod resolver;

pub use credential::{Credential, CredentialUsage};
pub(crate) use credential::extract_subject_public_key;
pub use criteria::{Criterion, CriteriaSet};
pub use resolver::{CredentialPool, SignatureTrustResolver};
