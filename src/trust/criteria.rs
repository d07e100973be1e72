//! Trust criteria.
//!
//! A [`CriteriaSet`] narrows the credential pool before signature trust
//! evaluation. It is immutable once built and owned by the validation call
//! that constructed it.

use serde::{Deserialize, Serialize};

use super::{Credential, CredentialUsage};

/// A typed selector over credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Entity ID must equal the given value.
    EntityId(String),
    /// Credential usage must satisfy the given usage.
    Usage(CredentialUsage),
    /// SHA-256 digest of the credential's certificate must equal the given
    /// digest.
    X509DigestSha256(Vec<u8>),
    /// Verification key bytes must equal the given key.
    PublicKey(Vec<u8>),
}

impl Criterion {
    /// Match weight against a credential, `None` when the credential does
    /// not satisfy the criterion.
    ///
    /// Weights order candidates by specificity: key-material matches rank
    /// above entity-id matches, which rank above usage matches. A usage
    /// criterion satisfied via [`CredentialUsage::Any`] scores below an
    /// exact usage match.
    fn match_weight(&self, credential: &Credential) -> Option<u32> {
        match self {
            Self::EntityId(entity_id) => {
                (credential.entity_id.as_deref() == Some(entity_id.as_str())).then_some(4)
            }
            Self::Usage(requested) => {
                if credential.usage == *requested {
                    Some(2)
                } else if credential.usage.satisfies(*requested) {
                    Some(1)
                } else {
                    None
                }
            }
            Self::X509DigestSha256(digest) => (credential.certificate_digest_sha256().as_deref()
                == Some(digest.as_slice()))
            .then_some(8),
            Self::PublicKey(key) => {
                (credential.public_key.as_deref() == Some(key.as_slice())).then_some(8)
            }
        }
    }
}

/// An unordered, immutable set of criteria.
///
/// A credential is a candidate only when it satisfies every criterion in
/// the set. An empty set admits the whole pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaSet {
    criteria: Vec<Criterion>,
}

impl CriteriaSet {
    /// Creates an empty criteria set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a criterion. Consumes `self`; the set is immutable once built.
    #[must_use]
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Shorthand for the common entity-id + signing-usage selector.
    #[must_use]
    pub fn signing_for(entity_id: impl Into<String>) -> Self {
        Self::new()
            .with(Criterion::EntityId(entity_id.into()))
            .with(Criterion::Usage(CredentialUsage::Signing))
    }

    /// Whether the set holds no criteria.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Number of criteria in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Total match weight of a credential, `None` when any criterion
    /// rejects it.
    #[must_use]
    pub fn match_weight(&self, credential: &Credential) -> Option<u32> {
        let mut total = 0;
        for criterion in &self.criteria {
            total += criterion.match_weight(credential)?;
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_credential(entity: &str, usage: CredentialUsage) -> Credential {
        Credential::signing_key(entity, vec![1, 2, 3]).with_usage(usage)
    }

    #[test]
    fn empty_set_admits_everything() {
        let set = CriteriaSet::new();
        let cred = pool_credential("https://idp.example.org", CredentialUsage::Signing);
        assert_eq!(set.match_weight(&cred), Some(0));
    }

    #[test]
    fn entity_id_mismatch_rejects() {
        let set = CriteriaSet::signing_for("https://idp.example.org");
        let cred = pool_credential("https://other.example.org", CredentialUsage::Signing);
        assert!(set.match_weight(&cred).is_none());
    }

    #[test]
    fn exact_usage_outranks_any() {
        let set = CriteriaSet::new().with(Criterion::Usage(CredentialUsage::Signing));
        let exact = pool_credential("e", CredentialUsage::Signing);
        let any = pool_credential("e", CredentialUsage::Any);
        assert!(set.match_weight(&exact).unwrap() > set.match_weight(&any).unwrap());
    }

    #[test]
    fn digest_criterion_requires_certificate() {
        let set = CriteriaSet::new().with(Criterion::X509DigestSha256(vec![0u8; 32]));
        let keyed = pool_credential("e", CredentialUsage::Signing);
        assert!(set.match_weight(&keyed).is_none());
    }

    #[test]
    fn digest_criterion_matches_certificate() {
        let cert = vec![5u8; 16];
        let cred = Credential::signing_certificate("e", cert);
        let digest = cred.certificate_digest_sha256().unwrap();
        let set = CriteriaSet::new().with(Criterion::X509DigestSha256(digest));
        assert!(set.match_weight(&cred).is_some());
    }
}
