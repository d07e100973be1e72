//! End-to-end validation scenarios exercising the full orchestrator.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use saml_assertion_validation::{
    params, Assertion, AssertionValidator, Conditions, Credential, CredentialPool, CriteriaSet,
    Criterion, FixedClock, KeyInfo, ParamValue, ReplayCache, Signature, SignatureAlgorithm,
    SignatureTrustResolver, SignatureVerifier, Subject, SubjectConfirmation,
    SubjectConfirmationData, ValidationContext, Verdict, VerifyError,
};

/// Accepts a signature when its value equals the credential's raw key bytes.
struct KeyEqualsVerifier;

impl SignatureVerifier for KeyEqualsVerifier {
    fn verify(
        &self,
        credential: &Credential,
        _algorithm: SignatureAlgorithm,
        _data: &[u8],
        signature: &[u8],
    ) -> Result<bool, VerifyError> {
        match credential.public_key.as_deref() {
            Some(key) => Ok(key == signature),
            None => {
                // Certificate-only credentials verify against the cert bytes.
                Ok(credential.certificate.as_deref() == Some(signature))
            }
        }
    }
}

struct Harness {
    now: DateTime<Utc>,
    validator: AssertionValidator,
    replay_cache: ReplayCache,
}

impl Harness {
    fn new(credentials: Vec<Credential>) -> Self {
        let now = Utc::now();
        let clock = Arc::new(FixedClock(now));
        let replay_cache =
            ReplayCache::with_clock(Duration::minutes(5), Arc::new(FixedClock(now)));
        let trust = SignatureTrustResolver::new(
            Arc::new(CredentialPool::from_credentials(credentials)),
            Arc::new(KeyEqualsVerifier),
        );
        let validator =
            AssertionValidator::with_defaults(trust, replay_cache.clone()).with_clock(clock);
        Self {
            now,
            validator,
            replay_cache,
        }
    }

    fn context(&self) -> ValidationContext {
        ValidationContext::new()
            .with_static(
                params::SC_VALID_RECIPIENTS,
                string_set(&["https://sp.example.org/acs"]),
            )
            .with_static(
                params::COND_VALID_AUDIENCES,
                string_set(&["https://sp.example.org", "https://other"]),
            )
            .with_static(params::CLOCK_SKEW, ParamValue::Duration(Duration::minutes(2)))
    }

    fn bearer_assertion(&self, id: &str) -> Assertion {
        Assertion::with_id(id, "https://idp.example.org")
            .with_issue_instant(self.now)
            .with_subject(Subject::new("user@example.org").with_confirmation(
                SubjectConfirmation::bearer().with_data(
                    SubjectConfirmationData::default()
                        .with_recipient("https://sp.example.org/acs")
                        .with_not_on_or_after(self.now + Duration::minutes(5)),
                ),
            ))
            .with_conditions(Conditions::with_window(
                self.now - Duration::minutes(1),
                self.now + Duration::minutes(5),
            ))
    }
}

fn string_set(values: &[&str]) -> ParamValue {
    ParamValue::StringSet(values.iter().map(ToString::to_string).collect::<HashSet<_>>())
}

#[test]
fn well_formed_bearer_assertion_is_valid() {
    let harness = Harness::new(vec![]);
    let mut ctx = harness.context();

    let verdict = harness
        .validator
        .validate(&harness.bearer_assertion("_a1"), &mut ctx);

    assert!(verdict.is_valid(), "failures: {:?}", ctx.failures());
    assert!(ctx
        .get_dynamic(params::CONFIRMED_SUBJECT_CONFIRMATION)
        .is_some());
}

#[test]
fn expired_beyond_skew_is_invalid_within_skew_is_valid() {
    let harness = Harness::new(vec![]);

    // Expired ten minutes ago with two minutes of skew: invalid.
    let expired = harness.bearer_assertion("_a2").with_conditions(
        Conditions::with_window(
            harness.now - Duration::minutes(20),
            harness.now - Duration::minutes(10),
        ),
    );
    let mut ctx = harness.context();
    assert!(matches!(
        harness.validator.validate(&expired, &mut ctx),
        Verdict::Invalid(_)
    ));

    // Expired one minute ago, still inside the two-minute skew: valid.
    let in_skew = harness.bearer_assertion("_a3").with_conditions(
        Conditions::with_window(
            harness.now - Duration::minutes(20),
            harness.now - Duration::minutes(1),
        ),
    );
    let mut ctx = harness.context();
    let verdict = harness.validator.validate(&in_skew, &mut ctx);
    assert!(verdict.is_valid(), "failures: {:?}", ctx.failures());
}

#[test]
fn audience_restriction_against_configured_set() {
    let harness = Harness::new(vec![]);

    let restricted = harness
        .bearer_assertion("_a4")
        .with_conditions(
            Conditions::with_window(harness.now, harness.now + Duration::minutes(5))
                .with_audience("https://sp.example.org"),
        );
    let mut ctx = harness.context();
    assert!(harness.validator.validate(&restricted, &mut ctx).is_valid());

    // Same restriction, but the context only accepts a different audience.
    let mut ctx = ValidationContext::new()
        .with_static(
            params::SC_VALID_RECIPIENTS,
            string_set(&["https://sp.example.org/acs"]),
        )
        .with_static(params::COND_VALID_AUDIENCES, string_set(&["https://other"]));
    let restricted = harness
        .bearer_assertion("_a5")
        .with_conditions(
            Conditions::with_window(harness.now, harness.now + Duration::minutes(5))
                .with_audience("https://sp.example.org"),
        );
    assert!(matches!(
        harness.validator.validate(&restricted, &mut ctx),
        Verdict::Invalid(_)
    ));

    // No restriction at all: valid regardless of configured audiences.
    let unrestricted = harness.bearer_assertion("_a6");
    let mut ctx = harness.context();
    assert!(harness.validator.validate(&unrestricted, &mut ctx).is_valid());
}

#[test]
fn bearer_recipient_mismatch_is_invalid() {
    let harness = Harness::new(vec![]);
    let assertion = Assertion::with_id("_a7", "https://idp.example.org")
        .with_issue_instant(harness.now)
        .with_subject(Subject::new("user@example.org").with_confirmation(
            SubjectConfirmation::bearer().with_data(
                SubjectConfirmationData::default()
                    .with_recipient("https://evil.example.org/acs")
                    .with_not_on_or_after(harness.now + Duration::minutes(5)),
            ),
        ));
    let mut ctx = harness.context();

    let verdict = harness.validator.validate(&assertion, &mut ctx);
    assert!(matches!(verdict, Verdict::Invalid(_)));
    assert!(verdict
        .messages()
        .iter()
        .any(|m| m.contains("evil.example.org")));
}

#[test]
fn expired_holder_of_key_confirmation_is_invalid() {
    let harness = Harness::new(vec![]);
    let key = b"presenter-key".to_vec();
    let assertion = Assertion::with_id("_hok1", "https://idp.example.org")
        .with_issue_instant(harness.now)
        .with_subject(Subject::new("user@example.org").with_confirmation(
            SubjectConfirmation::holder_of_key().with_data(
                SubjectConfirmationData::default()
                    .with_key_info(KeyInfo::from_public_key(key.clone()))
                    .with_not_on_or_after(harness.now - Duration::hours(1)),
            ),
        ));
    let mut ctx = harness
        .context()
        .with_static(params::SC_HOK_PRESENTER_KEY, ParamValue::Bytes(key));

    // The presenter key matches, but the confirmation window has passed.
    let verdict = harness.validator.validate(&assertion, &mut ctx);
    assert!(matches!(verdict, Verdict::Invalid(_)));
    assert!(verdict
        .messages()
        .iter()
        .any(|m| m.contains("NotOnOrAfter")));
}

#[test]
fn required_signature_missing_fails_fast_with_single_message() {
    let harness = Harness::new(vec![]);
    // Give the assertion a failing condition and confirmation too; none of
    // them may be evaluated.
    let assertion = harness.bearer_assertion("_a8").with_conditions(
        Conditions::with_window(
            harness.now - Duration::minutes(20),
            harness.now - Duration::minutes(10),
        ),
    );
    let mut ctx = harness
        .context()
        .with_static(params::SIGNATURE_REQUIRED, ParamValue::Flag(true));

    let verdict = harness.validator.validate(&assertion, &mut ctx);
    assert!(matches!(verdict, Verdict::Invalid(_)));
    assert_eq!(verdict.messages().len(), 1);
    assert!(verdict.messages()[0].contains("signature"));
}

#[test]
fn validation_is_idempotent_except_one_time_use() {
    let harness = Harness::new(vec![]);

    let plain = harness.bearer_assertion("_a9");
    let mut first = harness.context();
    let mut second = harness.context();
    assert_eq!(
        harness.validator.validate(&plain, &mut first),
        harness.validator.validate(&plain, &mut second)
    );

    let one_time = harness.bearer_assertion("_a10").with_conditions(
        Conditions::with_window(harness.now, harness.now + Duration::minutes(5)).one_time_use(),
    );
    let mut first = harness.context();
    let mut second = harness.context();
    assert!(harness.validator.validate(&one_time, &mut first).is_valid());
    let verdict = harness.validator.validate(&one_time, &mut second);
    assert!(matches!(verdict, Verdict::Invalid(_)));
    assert!(verdict
        .messages()
        .iter()
        .any(|m| m.contains("replay") && m.contains("_a10")));
}

#[test]
fn replay_key_usable_again_after_expiration() {
    let now = Utc::now();
    // Cache clock sits past the recorded expiration.
    let cache = ReplayCache::with_clock(
        Duration::minutes(5),
        Arc::new(FixedClock(now + Duration::minutes(10))),
    );
    cache.check_and_record("https://idp.example.org:_a11", now).unwrap();
    assert!(cache
        .check_and_record("https://idp.example.org:_a11", now + Duration::minutes(20))
        .is_ok());
}

#[test]
fn digest_matching_credential_wins_regardless_of_pool_order() {
    let cert = b"idp-certificate-der".to_vec();
    let digest_cred = Credential::signing_certificate("https://idp.example.org", cert.clone());
    let digest = digest_cred.certificate_digest_sha256().unwrap();
    let name_cred = Credential::signing_key("https://idp.example.org", b"other-key".to_vec());

    for pool in [
        vec![name_cred.clone(), digest_cred.clone()],
        vec![digest_cred.clone(), name_cred.clone()],
    ] {
        let harness = Harness::new(pool);
        let assertion = harness.bearer_assertion("_a12").with_signature(Signature::new(
            SignatureAlgorithm::RsaSha256,
            b"payload".to_vec(),
            // KeyEqualsVerifier: verifies only against the certificate bytes.
            cert.clone(),
        ));
        let mut ctx = harness.context().with_static(
            params::SIGNATURE_VALIDATION_CRITERIA,
            ParamValue::Criteria(
                CriteriaSet::new()
                    .with(Criterion::EntityId("https://idp.example.org".to_string()))
                    .with(Criterion::X509DigestSha256(digest.clone())),
            ),
        );

        let verdict = harness.validator.validate(&assertion, &mut ctx);
        assert!(verdict.is_valid(), "failures: {:?}", ctx.failures());
    }
}

#[test]
fn one_time_use_caches_are_isolated_per_instance() {
    let one_time = |harness: &Harness, id: &str| {
        harness.bearer_assertion(id).with_conditions(
            Conditions::with_window(harness.now, harness.now + Duration::minutes(5))
                .one_time_use(),
        )
    };

    let first = Harness::new(vec![]);
    let second = Harness::new(vec![]);

    let mut ctx = first.context();
    assert!(first
        .validator
        .validate(&one_time(&first, "_shared"), &mut ctx)
        .is_valid());
    assert_eq!(first.replay_cache.len(), 1);

    // A different engine with its own cache has not seen the key.
    let mut ctx = second.context();
    assert!(second
        .validator
        .validate(&one_time(&second, "_shared"), &mut ctx)
        .is_valid());
}
