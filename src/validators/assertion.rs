//! Assertion validation orchestrator.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::context::{params, ParamValue, ValidationContext};
use crate::error::ValidationError;
use crate::replay::ReplayCache;
use crate::trust::SignatureTrustResolver;
use crate::types::Assertion;

use super::{
    AudienceConditionValidator, BearerConfirmationValidator, ConditionValidator,
    HolderOfKeyConfirmationValidator, OneTimeUseConditionValidator,
    SubjectConfirmationValidator, TimeWindowConditionValidator, ValidationOutcome, Verdict,
};

/// Validates assertions by running, in order: signature trust, condition
/// validators, and subject confirmation validators.
///
/// Additional validators can be registered without modifying the
/// orchestration; each validation call is a pure function of the assertion,
/// its context, the shared replay cache, and the shared credential pool.
pub struct AssertionValidator {
    trust: SignatureTrustResolver,
    condition_validators: Vec<Box<dyn ConditionValidator>>,
    confirmation_validators: Vec<Box<dyn SubjectConfirmationValidator>>,
    clock: Arc<dyn Clock>,
}

impl AssertionValidator {
    /// Creates an orchestrator with no registered validators.
    #[must_use]
    pub fn new(trust: SignatureTrustResolver) -> Self {
        Self {
            trust,
            condition_validators: Vec::new(),
            confirmation_validators: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates an orchestrator wired with the standard validator set:
    /// time window, audience restriction, one-time use, bearer, and
    /// holder-of-key.
    #[must_use]
    pub fn with_defaults(trust: SignatureTrustResolver, replay_cache: ReplayCache) -> Self {
        let mut validator = Self::new(trust);
        validator.register_condition_validator(Box::new(TimeWindowConditionValidator));
        validator.register_condition_validator(Box::new(AudienceConditionValidator));
        validator
            .register_condition_validator(Box::new(OneTimeUseConditionValidator::new(replay_cache)));
        validator.register_confirmation_validator(Box::new(BearerConfirmationValidator));
        validator.register_confirmation_validator(Box::new(HolderOfKeyConfirmationValidator));
        validator
    }

    /// Substitutes the clock (deterministic tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Registers a condition validator at the end of the chain.
    pub fn register_condition_validator(&mut self, validator: Box<dyn ConditionValidator>) {
        self.condition_validators.push(validator);
    }

    /// Registers a subject confirmation validator at the end of the chain.
    pub fn register_confirmation_validator(
        &mut self,
        validator: Box<dyn SubjectConfirmationValidator>,
    ) {
        self.confirmation_validators.push(validator);
    }

    /// Validates an assertion, producing exactly one verdict.
    ///
    /// VALID only when every phase is VALID; any INVALID yields INVALID;
    /// mandatory configuration missing anywhere yields INDETERMINATE.
    pub fn validate(&self, assertion: &Assertion, context: &mut ValidationContext) -> Verdict {
        let now = self.clock.now();
        let skew = context.clock_skew();
        let collect_all = context.static_flag(params::COLLECT_ALL_FAILURES);
        let strict = context.static_flag(params::STRICT);

        // Phase 1: signature presence and trust. The only fail-fast point:
        // an untrusted assertion must not leak further diagnostics.
        if let Some(outcome) = self.check_signature(assertion, context) {
            return Verdict::from_outcome(outcome, context);
        }

        if assertion.version != "2.0" {
            context.add_failure(format!("unsupported SAML version '{}'", assertion.version));
            return Verdict::from_outcome(ValidationOutcome::Invalid, context);
        }

        // Phase 2: conditions.
        let mut conditions_outcome = ValidationOutcome::Valid;

        let freshness_bound = now
            .checked_add_signed(skew)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);
        if assertion.issue_instant > freshness_bound {
            conditions_outcome = ValidationOutcome::from_error(
                &ValidationError::Temporal(format!(
                    "assertion issue instant {} is in the future",
                    assertion.issue_instant
                )),
                context,
            );
        }

        if let Some(conditions) = assertion.conditions.as_ref() {
            if !(conditions_outcome == ValidationOutcome::Invalid && !collect_all) {
                for validator in &self.condition_validators {
                    let outcome = validator.validate(assertion, conditions, context, now);
                    tracing::debug!(
                        validator = validator.name(),
                        assertion = %assertion.id,
                        ?outcome,
                        "condition validator finished"
                    );
                    conditions_outcome = conditions_outcome.and(outcome);
                    if outcome == ValidationOutcome::Invalid && !collect_all {
                        break;
                    }
                }
            }

            if conditions.proxy_restriction.is_some() {
                if strict {
                    context.add_failure(
                        "proxy restriction present but cannot be evaluated".to_string(),
                    );
                    conditions_outcome = conditions_outcome.and(ValidationOutcome::Indeterminate);
                } else {
                    tracing::debug!(assertion = %assertion.id, "skipping proxy restriction");
                }
            }
        }

        if conditions_outcome == ValidationOutcome::Invalid && !collect_all {
            return Verdict::from_outcome(ValidationOutcome::Invalid, context);
        }

        // Phase 3: subject confirmation.
        let confirmation_outcome = self.check_confirmations(assertion, context, now, strict);

        Verdict::from_outcome(conditions_outcome.and(confirmation_outcome), context)
    }

    /// Signature phase. `Some(outcome)` means terminate with that outcome.
    fn check_signature(
        &self,
        assertion: &Assertion,
        context: &mut ValidationContext,
    ) -> Option<ValidationOutcome> {
        let Some(signature) = assertion.signature.as_ref() else {
            if context.static_flag(params::SIGNATURE_REQUIRED) {
                tracing::warn!(assertion = %assertion.id, "required signature is absent");
                return Some(ValidationOutcome::from_error(
                    &ValidationError::Integrity(
                        "assertion is unsigned but a signature is required".to_string(),
                    ),
                    context,
                ));
            }
            tracing::debug!(assertion = %assertion.id, "assertion unsigned, signature not required");
            return None;
        };

        let Some(criteria) = context
            .static_criteria(params::SIGNATURE_VALIDATION_CRITERIA)
            .cloned()
        else {
            return Some(ValidationOutcome::from_error(
                &ValidationError::Configuration(format!(
                    "assertion is signed but '{}' is not configured",
                    params::SIGNATURE_VALIDATION_CRITERIA
                )),
                context,
            ));
        };

        match self.trust.validate_signature(signature, &criteria) {
            Ok(credential) => {
                tracing::debug!(
                    assertion = %assertion.id,
                    credential = %credential.fingerprint(),
                    "assertion signature trusted"
                );
                None
            }
            // NoCandidates vs NotTrusted are logged apart by the resolver;
            // both are INVALID here.
            Err(error) => Some(ValidationOutcome::from_error(
                &ValidationError::Integrity(error.to_string()),
                context,
            )),
        }
    }

    /// Confirmation phase: the subject is confirmed by the first method
    /// that validates; rejected methods record messages without aborting.
    fn check_confirmations(
        &self,
        assertion: &Assertion,
        context: &mut ValidationContext,
        now: chrono::DateTime<chrono::Utc>,
        strict: bool,
    ) -> ValidationOutcome {
        let confirmations = assertion.subject_confirmations();
        if confirmations.is_empty() {
            context.add_failure("assertion carries no subject confirmations".to_string());
            return ValidationOutcome::Indeterminate;
        }

        let mut saw_invalid = false;
        let mut saw_indeterminate = false;
        let mut evaluated = false;

        for confirmation in confirmations {
            let Some(validator) = self
                .confirmation_validators
                .iter()
                .find(|v| v.method() == confirmation.method)
            else {
                if strict {
                    context.add_failure(format!(
                        "unsupported confirmation method '{}'",
                        confirmation.method
                    ));
                    saw_indeterminate = true;
                } else {
                    tracing::debug!(
                        method = %confirmation.method,
                        "skipping unsupported confirmation method"
                    );
                }
                continue;
            };

            evaluated = true;
            match validator.validate(assertion, confirmation, context, now) {
                ValidationOutcome::Valid => {
                    context.set_dynamic(
                        params::CONFIRMED_SUBJECT_CONFIRMATION,
                        ParamValue::Confirmation(confirmation.clone()),
                    );
                    tracing::debug!(
                        assertion = %assertion.id,
                        method = %confirmation.method,
                        "subject confirmed"
                    );
                    return ValidationOutcome::Valid;
                }
                ValidationOutcome::Invalid => saw_invalid = true,
                ValidationOutcome::Indeterminate => saw_indeterminate = true,
            }
        }

        if saw_invalid {
            ValidationOutcome::Invalid
        } else if saw_indeterminate {
            ValidationOutcome::Indeterminate
        } else {
            debug_assert!(!evaluated);
            context.add_failure("no subject confirmation method could be evaluated".to_string());
            ValidationOutcome::Indeterminate
        }
    }
}
