//! Per-validation parameter and result bag.
//!
//! A [`ValidationContext`] carries the static configuration a caller supplies
//! for one validation call, the dynamic facts validators derive while
//! running, and the ordered failure messages that explain a non-valid
//! verdict. Static parameters are frozen at construction; only dynamic
//! parameters and messages are appended afterwards.

use std::collections::{HashMap, HashSet};

use chrono::Duration;

use crate::trust::CriteriaSet;
use crate::types::{KeyInfo, SubjectConfirmation};

/// Named parameter keys understood by the engine.
///
/// Grouped by prefix: bare `saml2.*` keys configure the engine as a whole,
/// `saml2.Conditions.*` the condition validators, and
/// `saml2.SubjectConfirmation.*` the subject confirmation validators.
pub mod params {
    /// Clock skew tolerance ([`ParamValue::Duration`](super::ParamValue::Duration)).
    pub const CLOCK_SKEW: &str = "saml2.ClockSkew";

    /// Whether the assertion must be signed ([`ParamValue::Flag`](super::ParamValue::Flag)).
    pub const SIGNATURE_REQUIRED: &str = "saml2.SignatureRequired";

    /// Criteria set used to resolve signature trust candidates
    /// ([`ParamValue::Criteria`](super::ParamValue::Criteria)).
    pub const SIGNATURE_VALIDATION_CRITERIA: &str = "saml2.SignatureValidationCriteriaSet";

    /// Keep evaluating after the first INVALID phase
    /// ([`ParamValue::Flag`](super::ParamValue::Flag)).
    pub const COLLECT_ALL_FAILURES: &str = "saml2.CollectAllFailures";

    /// Treat unknown confirmation methods and unenforceable conditions as
    /// INDETERMINATE instead of skipping them
    /// ([`ParamValue::Flag`](super::ParamValue::Flag)).
    pub const STRICT: &str = "saml2.Strict";

    /// Acceptable audience URIs ([`ParamValue::StringSet`](super::ParamValue::StringSet)).
    pub const COND_VALID_AUDIENCES: &str = "saml2.Conditions.ValidAudiences";

    /// Per-invocation replay cache expiration for one-time-use assertions
    /// ([`ParamValue::Duration`](super::ParamValue::Duration)).
    pub const COND_ONE_TIME_USE_EXPIRES: &str = "saml2.Conditions.OneTimeUseExpires";

    /// Acceptable confirmation data recipients
    /// ([`ParamValue::StringSet`](super::ParamValue::StringSet)).
    pub const SC_VALID_RECIPIENTS: &str = "saml2.SubjectConfirmation.ValidRecipients";

    /// Acceptable presenter addresses; if set, the confirmation address is
    /// enforced ([`ParamValue::StringSet`](super::ParamValue::StringSet)).
    pub const SC_VALID_ADDRESSES: &str = "saml2.SubjectConfirmation.ValidAddresses";

    /// Required InResponseTo correlation value
    /// ([`ParamValue::Text`](super::ParamValue::Text)).
    pub const SC_IN_RESPONSE_TO: &str = "saml2.SubjectConfirmation.InResponseTo";

    /// Public key (SPKI DER) the presenter proved possession of during the
    /// transport handshake ([`ParamValue::Bytes`](super::ParamValue::Bytes)).
    pub const SC_HOK_PRESENTER_KEY: &str = "saml2.SubjectConfirmation.HoK.PresenterKey";

    /// Certificate (X.509 DER) the presenter used during the transport
    /// handshake ([`ParamValue::Bytes`](super::ParamValue::Bytes)).
    pub const SC_HOK_PRESENTER_CERT: &str = "saml2.SubjectConfirmation.HoK.PresenterCertificate";

    /// Output: the subject confirmation that confirmed the subject
    /// ([`ParamValue::Confirmation`](super::ParamValue::Confirmation)).
    pub const CONFIRMED_SUBJECT_CONFIRMATION: &str = "saml2.ConfirmedSubjectConfirmation";

    /// Output: the key info that confirmed the subject via holder-of-key
    /// ([`ParamValue::KeyInfo`](super::ParamValue::KeyInfo)).
    pub const SC_HOK_CONFIRMED_KEYINFO: &str = "saml2.SubjectConfirmation.HoK.ConfirmedKeyInfo";
}

/// A typed parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// A duration (clock skew, cache expirations).
    Duration(Duration),
    /// A boolean flag.
    Flag(bool),
    /// A set of strings (audiences, recipients, addresses).
    StringSet(HashSet<String>),
    /// A single string value.
    Text(String),
    /// Raw bytes (DER key or certificate material).
    Bytes(Vec<u8>),
    /// A trust criteria set.
    Criteria(CriteriaSet),
    /// A subject confirmation (validator output).
    Confirmation(SubjectConfirmation),
    /// Key info (validator output).
    KeyInfo(KeyInfo),
}

/// Mutable, short-lived parameter and result bag for one validation call.
#[derive(Debug, Default)]
pub struct ValidationContext {
    static_params: HashMap<&'static str, ParamValue>,
    dynamic_params: HashMap<&'static str, ParamValue>,
    failures: Vec<String>,
}

impl ValidationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a static parameter. Consumes `self` so statics cannot change
    /// once the context is in use.
    #[must_use]
    pub fn with_static(mut self, name: &'static str, value: ParamValue) -> Self {
        self.static_params.insert(name, value);
        self
    }

    /// Looks up a static parameter.
    #[must_use]
    pub fn get_static(&self, name: &str) -> Option<&ParamValue> {
        self.static_params.get(name)
    }

    /// Looks up a dynamic parameter.
    #[must_use]
    pub fn get_dynamic(&self, name: &str) -> Option<&ParamValue> {
        self.dynamic_params.get(name)
    }

    /// Records a dynamic parameter derived during validation.
    pub fn set_dynamic(&mut self, name: &'static str, value: ParamValue) {
        self.dynamic_params.insert(name, value);
    }

    /// Appends a failure message.
    pub fn add_failure(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    /// The ordered failure messages recorded so far.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Static duration parameter, if present.
    #[must_use]
    pub fn static_duration(&self, name: &str) -> Option<Duration> {
        match self.get_static(name) {
            Some(ParamValue::Duration(d)) => Some(*d),
            _ => None,
        }
    }

    /// Static flag parameter; absent flags read as `false`.
    #[must_use]
    pub fn static_flag(&self, name: &str) -> bool {
        matches!(self.get_static(name), Some(ParamValue::Flag(true)))
    }

    /// Static string-set parameter, if present.
    #[must_use]
    pub fn static_string_set(&self, name: &str) -> Option<&HashSet<String>> {
        match self.get_static(name) {
            Some(ParamValue::StringSet(s)) => Some(s),
            _ => None,
        }
    }

    /// Static text parameter, if present.
    #[must_use]
    pub fn static_text(&self, name: &str) -> Option<&str> {
        match self.get_static(name) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Static byte parameter, if present.
    #[must_use]
    pub fn static_bytes(&self, name: &str) -> Option<&[u8]> {
        match self.get_static(name) {
            Some(ParamValue::Bytes(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Static criteria-set parameter, if present.
    #[must_use]
    pub fn static_criteria(&self, name: &str) -> Option<&CriteriaSet> {
        match self.get_static(name) {
            Some(ParamValue::Criteria(c)) => Some(c),
            _ => None,
        }
    }

    /// The configured clock skew, defaulting to zero.
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        self.static_duration(params::CLOCK_SKEW)
            .unwrap_or_else(Duration::zero)
    }
}
