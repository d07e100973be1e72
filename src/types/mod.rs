//! Assertion object model.
//!
//! These types are the already-parsed view of an assertion that the engine
//! consumes. The engine never mutates them; validation output goes to the
//! [`ValidationContext`](crate::context::ValidationContext) instead.

mod assertion;
mod signature;

pub use assertion::{
    Assertion, AttributeStatement, AudienceRestriction, AuthnStatement, AuthzDecisionStatement,
    Conditions, ProxyRestriction, SamlAttribute, Statement, Subject, SubjectConfirmation,
    SubjectConfirmationData,
};
pub use signature::{KeyInfo, Signature, SignatureAlgorithm};
