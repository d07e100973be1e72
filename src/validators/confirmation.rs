//! Subject confirmation validators: bearer and holder-of-key.

use aws_lc_rs::digest::{digest, SHA256};
use chrono::{DateTime, Utc};

use crate::context::{params, ParamValue, ValidationContext};
use crate::error::ValidationError;
use crate::trust::extract_subject_public_key;
use crate::types::{Assertion, KeyInfo, SubjectConfirmation, SubjectConfirmationData};

use super::{SubjectConfirmationValidator, ValidationOutcome};

/// Validates bearer confirmations.
///
/// A bearer confirmation passes when its recipient is one of the configured
/// valid recipients, its time bounds (skew-adjusted) hold, the InResponseTo
/// correlation matches when one is required, and the presenter address (when
/// both present and enforced) is acceptable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerConfirmationValidator;

impl SubjectConfirmationValidator for BearerConfirmationValidator {
    fn method(&self) -> &'static str {
        SubjectConfirmation::BEARER
    }

    fn validate(
        &self,
        _assertion: &Assertion,
        confirmation: &SubjectConfirmation,
        context: &mut ValidationContext,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        let Some(data) = confirmation.subject_confirmation_data.as_ref() else {
            return ValidationOutcome::from_error(
                &ValidationError::SubjectMismatch(
                    "bearer confirmation carries no confirmation data".to_string(),
                ),
                context,
            );
        };

        // A bearer evaluation with no recipient allow-list is a
        // configuration error, not a pass.
        let Some(valid_recipients) = context
            .static_string_set(params::SC_VALID_RECIPIENTS)
            .filter(|set| !set.is_empty())
            .cloned()
        else {
            return ValidationOutcome::from_error(
                &ValidationError::Configuration(format!(
                    "'{}' is not configured",
                    params::SC_VALID_RECIPIENTS
                )),
                context,
            );
        };

        match data.recipient.as_deref() {
            Some(recipient) if valid_recipients.contains(recipient) => {}
            Some(recipient) => {
                return ValidationOutcome::from_error(
                    &ValidationError::SubjectMismatch(format!(
                        "bearer recipient '{recipient}' is not an acceptable recipient"
                    )),
                    context,
                );
            }
            None => {
                return ValidationOutcome::from_error(
                    &ValidationError::SubjectMismatch(
                        "bearer confirmation data has no recipient".to_string(),
                    ),
                    context,
                );
            }
        }

        if let Some(outcome) = check_time_bounds(data, context, now, true) {
            return outcome;
        }

        if let Some(required) = context.static_text(params::SC_IN_RESPONSE_TO) {
            if data.in_response_to.as_deref() != Some(required) {
                return ValidationOutcome::from_error(
                    &ValidationError::SubjectMismatch(format!(
                        "bearer InResponseTo '{}' does not match required '{required}'",
                        data.in_response_to.as_deref().unwrap_or("<absent>")
                    )),
                    context,
                );
            }
        }

        if let Some(outcome) = check_address(data, context) {
            return outcome;
        }

        ValidationOutcome::Valid
    }
}

/// Checks NotBefore/NotOnOrAfter on confirmation data with skew tolerance.
///
/// Bearer confirmation data must carry NotOnOrAfter; other methods may omit
/// it. Skew adjustments saturate at the bound itself rather than overflowing
/// on extreme timestamps.
fn check_time_bounds(
    data: &SubjectConfirmationData,
    context: &mut ValidationContext,
    now: DateTime<Utc>,
    require_not_on_or_after: bool,
) -> Option<ValidationOutcome> {
    let skew = context.clock_skew();

    match data.not_on_or_after {
        Some(not_on_or_after) => {
            let upper = not_on_or_after
                .checked_add_signed(skew)
                .unwrap_or(not_on_or_after);
            if now >= upper {
                return Some(ValidationOutcome::from_error(
                    &ValidationError::Temporal(format!(
                        "confirmation expired: NotOnOrAfter {not_on_or_after} has passed"
                    )),
                    context,
                ));
            }
        }
        None if require_not_on_or_after => {
            return Some(ValidationOutcome::from_error(
                &ValidationError::Temporal(
                    "confirmation data has no NotOnOrAfter".to_string(),
                ),
                context,
            ));
        }
        None => {}
    }

    if let Some(not_before) = data.not_before {
        let lower = not_before.checked_sub_signed(skew).unwrap_or(not_before);
        if now < lower {
            return Some(ValidationOutcome::from_error(
                &ValidationError::Temporal(format!(
                    "confirmation not yet valid: NotBefore {not_before} is in the future"
                )),
                context,
            ));
        }
    }

    None
}

/// Checks the presenter address when an allow-list is configured and the
/// confirmation data carries one.
fn check_address(
    data: &SubjectConfirmationData,
    context: &mut ValidationContext,
) -> Option<ValidationOutcome> {
    let (Some(valid_addresses), Some(address)) = (
        context
            .static_string_set(params::SC_VALID_ADDRESSES)
            .filter(|set| !set.is_empty())
            .cloned(),
        data.address.as_deref(),
    ) else {
        return None;
    };

    if valid_addresses.contains(address) {
        None
    } else {
        Some(ValidationOutcome::from_error(
            &ValidationError::SubjectMismatch(format!(
                "presenter address '{address}' is not acceptable"
            )),
            context,
        ))
    }
}

/// Validates holder-of-key confirmations.
///
/// The key or certificate the peer presented during the transport handshake
/// must match the KeyInfo embedded in the confirmation data, by exact
/// key-material equality or by SHA-256 certificate digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct HolderOfKeyConfirmationValidator;

impl HolderOfKeyConfirmationValidator {
    fn key_info_matches(
        key_info: &KeyInfo,
        presenter_key: Option<&[u8]>,
        presenter_cert: Option<&[u8]>,
    ) -> bool {
        if let Some(key) = presenter_key {
            if key_info.public_keys.iter().any(|k| k == key) {
                return true;
            }
            // Certificates embedded in the KeyInfo confirm a bare presenter
            // key when they wrap the same key material.
            if key_info
                .certificates
                .iter()
                .any(|cert| extract_subject_public_key(cert).is_ok_and(|k| k == key))
            {
                return true;
            }
        }

        if let Some(cert) = presenter_cert {
            if key_info.certificates.iter().any(|c| c == cert) {
                return true;
            }
            let cert_digest = digest(&SHA256, cert);
            if key_info
                .certificate_digests_sha256
                .iter()
                .any(|d| d == cert_digest.as_ref())
            {
                return true;
            }
            // Fall back to comparing the key inside the presented
            // certificate against embedded keys.
            if let Ok(key) = extract_subject_public_key(cert) {
                if key_info.public_keys.iter().any(|k| *k == key) {
                    return true;
                }
            }
        }

        false
    }
}

impl SubjectConfirmationValidator for HolderOfKeyConfirmationValidator {
    fn method(&self) -> &'static str {
        SubjectConfirmation::HOLDER_OF_KEY
    }

    fn validate(
        &self,
        _assertion: &Assertion,
        confirmation: &SubjectConfirmation,
        context: &mut ValidationContext,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        let Some(data) = confirmation.subject_confirmation_data.as_ref() else {
            return ValidationOutcome::from_error(
                &ValidationError::SubjectMismatch(
                    "holder-of-key confirmation carries no confirmation data".to_string(),
                ),
                context,
            );
        };
        let key_info = match data.key_info.as_ref() {
            Some(key_info) if !key_info.is_empty() => key_info,
            _ => {
                return ValidationOutcome::from_error(
                    &ValidationError::SubjectMismatch(
                        "holder-of-key confirmation embeds no key material".to_string(),
                    ),
                    context,
                );
            }
        };

        // The data-level constraints apply to every confirmation method;
        // only NotOnOrAfter may be absent here.
        if let Some(outcome) = check_time_bounds(data, context, now, false) {
            return outcome;
        }
        if let Some(recipient) = data.recipient.as_deref() {
            if let Some(valid_recipients) = context
                .static_string_set(params::SC_VALID_RECIPIENTS)
                .filter(|set| !set.is_empty())
                .cloned()
            {
                if !valid_recipients.contains(recipient) {
                    return ValidationOutcome::from_error(
                        &ValidationError::SubjectMismatch(format!(
                            "holder-of-key recipient '{recipient}' is not an acceptable recipient"
                        )),
                        context,
                    );
                }
            }
        }
        if let Some(outcome) = check_address(data, context) {
            return outcome;
        }

        let presenter_key = context.static_bytes(params::SC_HOK_PRESENTER_KEY);
        let presenter_cert = context.static_bytes(params::SC_HOK_PRESENTER_CERT);
        if presenter_key.is_none() && presenter_cert.is_none() {
            return ValidationOutcome::from_error(
                &ValidationError::Configuration(format!(
                    "neither '{}' nor '{}' is available for holder-of-key confirmation",
                    params::SC_HOK_PRESENTER_KEY,
                    params::SC_HOK_PRESENTER_CERT
                )),
                context,
            );
        }

        if Self::key_info_matches(key_info, presenter_key, presenter_cert) {
            context.set_dynamic(
                params::SC_HOK_CONFIRMED_KEYINFO,
                ParamValue::KeyInfo(key_info.clone()),
            );
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::from_error(
                &ValidationError::SubjectMismatch(
                    "presenter key material does not match the confirmation KeyInfo".to_string(),
                ),
                context,
            )
        }
    }
}
