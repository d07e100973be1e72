//! Condition validators: time window, audience restriction, one-time use.

use chrono::{DateTime, Utc};

use crate::context::{params, ValidationContext};
use crate::error::ValidationError;
use crate::replay::ReplayCache;
use crate::types::{Assertion, Conditions};

use super::{ConditionValidator, ValidationOutcome};

/// Validates the NotBefore/NotOnOrAfter window with clock-skew tolerance.
///
/// Valid iff `NotBefore - skew <= now < NotOnOrAfter + skew`; an absent
/// bound imposes no constraint. Violations are INVALID, never INDETERMINATE.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindowConditionValidator;

impl ConditionValidator for TimeWindowConditionValidator {
    fn name(&self) -> &'static str {
        "time-window"
    }

    fn validate(
        &self,
        _assertion: &Assertion,
        conditions: &Conditions,
        context: &mut ValidationContext,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        let skew = context.clock_skew();

        if let Some(not_before) = conditions.not_before {
            // Saturate at the bound itself on extreme timestamps.
            let lower = not_before.checked_sub_signed(skew).unwrap_or(not_before);
            if now < lower {
                return ValidationOutcome::from_error(
                    &ValidationError::Temporal(format!(
                        "assertion not yet valid: NotBefore {not_before} is in the future"
                    )),
                    context,
                );
            }
        }

        if let Some(not_on_or_after) = conditions.not_on_or_after {
            let upper = not_on_or_after
                .checked_add_signed(skew)
                .unwrap_or(not_on_or_after);
            if now >= upper {
                return ValidationOutcome::from_error(
                    &ValidationError::Temporal(format!(
                        "assertion expired: NotOnOrAfter {not_on_or_after} has passed"
                    )),
                    context,
                );
            }
        }

        ValidationOutcome::Valid
    }
}

/// Validates audience restrictions against the configured audience set.
///
/// Vacuously valid when the assertion declares no restriction. Every
/// declared restriction must contain at least one configured audience
/// (exact string match).
#[derive(Debug, Clone, Copy, Default)]
pub struct AudienceConditionValidator;

impl ConditionValidator for AudienceConditionValidator {
    fn name(&self) -> &'static str {
        "audience-restriction"
    }

    fn validate(
        &self,
        _assertion: &Assertion,
        conditions: &Conditions,
        context: &mut ValidationContext,
        _now: DateTime<Utc>,
    ) -> ValidationOutcome {
        if conditions.audience_restrictions.is_empty() {
            return ValidationOutcome::Valid;
        }

        let Some(valid_audiences) = context
            .static_string_set(params::COND_VALID_AUDIENCES)
            .filter(|set| !set.is_empty())
            .cloned()
        else {
            return ValidationOutcome::from_error(
                &ValidationError::Configuration(format!(
                    "assertion restricts audiences but '{}' is not configured",
                    params::COND_VALID_AUDIENCES
                )),
                context,
            );
        };

        for restriction in &conditions.audience_restrictions {
            let satisfied = restriction
                .audiences
                .iter()
                .any(|audience| valid_audiences.contains(audience));
            if !satisfied {
                return ValidationOutcome::from_error(
                    &ValidationError::SubjectMismatch(format!(
                        "audience restriction [{}] contains no acceptable audience",
                        restriction.audiences.join(", ")
                    )),
                    context,
                );
            }
        }

        ValidationOutcome::Valid
    }
}

/// Enforces one-time use through the shared replay cache.
///
/// The replay key is `issuer:assertion-id`; the entry expiration comes from
/// the per-invocation context parameter, else the cache default.
pub struct OneTimeUseConditionValidator {
    cache: ReplayCache,
}

impl OneTimeUseConditionValidator {
    /// Creates a validator recording into the given cache.
    #[must_use]
    pub fn new(cache: ReplayCache) -> Self {
        Self { cache }
    }
}

impl ConditionValidator for OneTimeUseConditionValidator {
    fn name(&self) -> &'static str {
        "one-time-use"
    }

    fn validate(
        &self,
        assertion: &Assertion,
        conditions: &Conditions,
        context: &mut ValidationContext,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        if !conditions.one_time_use {
            return ValidationOutcome::Valid;
        }

        let expiration = context
            .static_duration(params::COND_ONE_TIME_USE_EXPIRES)
            .unwrap_or_else(|| self.cache.default_expiration());
        let key = format!("{}:{}", assertion.issuer, assertion.id);
        let expires_at = now
            .checked_add_signed(expiration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        match self.cache.check_and_record(key, expires_at) {
            Ok(()) => ValidationOutcome::Valid,
            Err(replay) => ValidationOutcome::from_error(
                &ValidationError::Temporal(replay.to_string()),
                context,
            ),
        }
    }
}
