//! Validator chain and verdict types.
//!
//! Individual validators report a tri-state [`ValidationOutcome`] and append
//! their diagnostics to the [`ValidationContext`]; the orchestrator folds
//! phase outcomes into a single message-carrying [`Verdict`].

mod assertion;
mod conditions;
mod confirmation;

pub use assertion::AssertionValidator;
pub use conditions::{
    AudienceConditionValidator, OneTimeUseConditionValidator, TimeWindowConditionValidator,
};
pub use confirmation::{BearerConfirmationValidator, HolderOfKeyConfirmationValidator};

use chrono::{DateTime, Utc};

use crate::context::ValidationContext;
use crate::error::ValidationError;
use crate::types::{Assertion, Conditions, SubjectConfirmation};

/// Tri-state result of one validator.
///
/// There is no fourth state: a validator either decided, or could not
/// evaluate because mandatory configuration was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The constraint was satisfied (including vacuously).
    Valid,
    /// The constraint was violated.
    Invalid,
    /// The constraint could not be evaluated.
    Indeterminate,
}

impl ValidationOutcome {
    /// ANDs two outcomes: any INVALID dominates, then any INDETERMINATE.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Invalid, _) | (_, Self::Invalid) => Self::Invalid,
            (Self::Indeterminate, _) | (_, Self::Indeterminate) => Self::Indeterminate,
            (Self::Valid, Self::Valid) => Self::Valid,
        }
    }

    /// Translates a locally recovered error into an outcome, appending its
    /// message to the context.
    ///
    /// Configuration errors are INDETERMINATE; integrity, temporal, and
    /// subject-mismatch errors are INVALID.
    pub fn from_error(error: &ValidationError, context: &mut ValidationContext) -> Self {
        context.add_failure(error.to_string());
        match error {
            ValidationError::Configuration(_) => Self::Indeterminate,
            ValidationError::Integrity(_)
            | ValidationError::Temporal(_)
            | ValidationError::SubjectMismatch(_) => Self::Invalid,
        }
    }
}

/// The aggregate outcome of a validation call, carrying the ordered failure
/// messages that explain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every phase was VALID.
    Valid,
    /// At least one constraint was violated.
    Invalid(Vec<String>),
    /// Mandatory configuration was missing somewhere; never treated as VALID.
    Indeterminate(Vec<String>),
}

impl Verdict {
    /// Whether the assertion may be trusted.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure messages, empty for a valid verdict.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Valid => &[],
            Self::Invalid(messages) | Self::Indeterminate(messages) => messages,
        }
    }

    pub(crate) fn from_outcome(outcome: ValidationOutcome, context: &ValidationContext) -> Self {
        match outcome {
            ValidationOutcome::Valid => Self::Valid,
            ValidationOutcome::Invalid => Self::Invalid(context.failures().to_vec()),
            ValidationOutcome::Indeterminate => Self::Indeterminate(context.failures().to_vec()),
        }
    }
}

/// Validates one kind of condition carried by an assertion.
///
/// Additional validators can be registered on the orchestrator without
/// modifying it.
pub trait ConditionValidator: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// Evaluates the conditions. Vacuous when no condition of this kind is
    /// present.
    fn validate(
        &self,
        assertion: &Assertion,
        conditions: &Conditions,
        context: &mut ValidationContext,
        now: DateTime<Utc>,
    ) -> ValidationOutcome;
}

/// Validates one subject confirmation method.
pub trait SubjectConfirmationValidator: Send + Sync {
    /// The confirmation method URI this validator handles.
    fn method(&self) -> &'static str;

    /// Evaluates a single confirmation of the handled method.
    fn validate(
        &self,
        assertion: &Assertion,
        confirmation: &SubjectConfirmation,
        context: &mut ValidationContext,
        now: DateTime<Utc>,
    ) -> ValidationOutcome;
}
