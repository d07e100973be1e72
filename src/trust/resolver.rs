//! Credential pool and signature trust resolution.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::TrustError;
use crate::types::Signature;
use crate::verify::SignatureVerifier;

use super::{Credential, CriteriaSet};

/// Read-mostly pool of trusted credentials.
///
/// Readers take an `Arc` snapshot; a concurrent refresh swaps the whole
/// vector, so in-flight validations see either the old or the new pool,
/// never a torn one.
#[derive(Debug, Default)]
pub struct CredentialPool {
    snapshot: RwLock<Arc<Vec<Credential>>>,
}

impl CredentialPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool holding the given credentials.
    #[must_use]
    pub fn from_credentials(credentials: Vec<Credential>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(credentials)),
        }
    }

    /// Replaces the entire pool (metadata refresh).
    pub fn replace_all(&self, credentials: Vec<Credential>) {
        *self.snapshot.write() = Arc::new(credentials);
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Credential>> {
        Arc::clone(&self.snapshot.read())
    }

    /// Number of credentials currently pooled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }
}

/// Decides whether a signature is acceptable given resolvable trusted
/// credentials.
///
/// Owns candidate selection and trust-decision sequencing; byte-level
/// cryptography is delegated to the injected [`SignatureVerifier`].
pub struct SignatureTrustResolver {
    pool: Arc<CredentialPool>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl SignatureTrustResolver {
    /// Creates a resolver over the given pool and verification primitive.
    #[must_use]
    pub fn new(pool: Arc<CredentialPool>, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { pool, verifier }
    }

    /// Resolves trust candidates for a criteria set.
    ///
    /// Recomputed per call from the current pool snapshot, ranked most
    /// specific match first.
    #[must_use]
    pub fn resolve_candidates(&self, criteria: &CriteriaSet) -> Vec<Credential> {
        let snapshot = self.pool.snapshot();
        let mut ranked: Vec<(u32, &Credential)> = snapshot
            .iter()
            .filter_map(|cred| criteria.match_weight(cred).map(|w| (w, cred)))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.into_iter().map(|(_, cred)| cred.clone()).collect()
    }

    /// Validates a signature against the candidates a criteria set resolves.
    ///
    /// Tries candidates in rank order; the first one whose key verifies the
    /// signature is returned as the trusted credential.
    ///
    /// # Errors
    ///
    /// [`TrustError::NoCandidates`] when the criteria resolve nothing
    /// (configuration or metadata problem); [`TrustError::NotTrusted`] when
    /// candidates resolved but none verified (integrity problem).
    pub fn validate_signature(
        &self,
        signature: &Signature,
        criteria: &CriteriaSet,
    ) -> Result<Credential, TrustError> {
        let candidates = self.resolve_candidates(criteria);
        if candidates.is_empty() {
            tracing::warn!(criteria = criteria.len(), "no trust candidates resolved");
            return Err(TrustError::NoCandidates);
        }

        let tried = candidates.len();
        for candidate in candidates {
            match self.verifier.verify(
                &candidate,
                signature.algorithm,
                &signature.signed_content,
                &signature.value,
            ) {
                Ok(true) => {
                    tracing::debug!(
                        credential = %candidate.fingerprint(),
                        "signature verified by trust candidate"
                    );
                    return Ok(candidate);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        credential = %candidate.fingerprint(),
                        error = %e,
                        "trust candidate unusable for verification"
                    );
                }
            }
        }

        tracing::warn!(candidates = tried, "signature did not verify against any candidate");
        Err(TrustError::NotTrusted { candidates: tried })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use crate::trust::{Criterion, CredentialUsage};
    use crate::types::SignatureAlgorithm;

    /// Accepts a signature when its value equals the credential's raw key.
    struct KeyEqualsVerifier;

    impl SignatureVerifier for KeyEqualsVerifier {
        fn verify(
            &self,
            credential: &Credential,
            _algorithm: SignatureAlgorithm,
            _data: &[u8],
            signature: &[u8],
        ) -> Result<bool, VerifyError> {
            Ok(credential.public_key.as_deref() == Some(signature))
        }
    }

    fn resolver(credentials: Vec<Credential>) -> SignatureTrustResolver {
        SignatureTrustResolver::new(
            Arc::new(CredentialPool::from_credentials(credentials)),
            Arc::new(KeyEqualsVerifier),
        )
    }

    fn signed(value: &[u8]) -> Signature {
        Signature::new(SignatureAlgorithm::RsaSha256, b"content".to_vec(), value.to_vec())
    }

    #[test]
    fn empty_pool_reports_no_candidates() {
        let resolver = resolver(vec![]);
        let err = resolver
            .validate_signature(&signed(b"k"), &CriteriaSet::new())
            .unwrap_err();
        assert!(matches!(err, TrustError::NoCandidates));
    }

    #[test]
    fn unverifiable_candidates_report_not_trusted() {
        let resolver = resolver(vec![Credential::signing_key("idp", b"other".to_vec())]);
        let err = resolver
            .validate_signature(&signed(b"k"), &CriteriaSet::new())
            .unwrap_err();
        assert!(matches!(err, TrustError::NotTrusted { candidates: 1 }));
    }

    #[test]
    fn first_verifying_candidate_wins() {
        let resolver = resolver(vec![
            Credential::signing_key("idp", b"wrong".to_vec()),
            Credential::signing_key("idp", b"right".to_vec()),
        ]);
        let trusted = resolver
            .validate_signature(&signed(b"right"), &CriteriaSet::new())
            .unwrap();
        assert_eq!(trusted.public_key.as_deref(), Some(b"right".as_slice()));
    }

    #[test]
    fn candidates_ranked_by_specificity() {
        let keyed = Credential::signing_key("idp", b"k".to_vec());
        let loose = Credential::signing_key("idp", b"x".to_vec()).with_usage(CredentialUsage::Any);
        let resolver = resolver(vec![loose, keyed]);

        let criteria = CriteriaSet::new()
            .with(Criterion::EntityId("idp".to_string()))
            .with(Criterion::Usage(CredentialUsage::Signing));
        let candidates = resolver.resolve_candidates(&criteria);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].public_key.as_deref(), Some(b"k".as_slice()));
    }

    #[test]
    fn resolution_recomputed_after_pool_refresh() {
        let pool = Arc::new(CredentialPool::from_credentials(vec![]));
        let resolver =
            SignatureTrustResolver::new(Arc::clone(&pool), Arc::new(KeyEqualsVerifier));

        assert!(resolver.resolve_candidates(&CriteriaSet::new()).is_empty());
        pool.replace_all(vec![Credential::signing_key("idp", b"k".to_vec())]);
        assert_eq!(resolver.resolve_candidates(&CriteriaSet::new()).len(), 1);
    }

    #[test]
    fn concurrent_refresh_never_yields_torn_snapshot() {
        let generation = |entity: &str| {
            vec![
                Credential::signing_key(entity, b"1".to_vec()),
                Credential::signing_key(entity, b"2".to_vec()),
            ]
        };
        let pool = Arc::new(CredentialPool::from_credentials(generation("old")));
        let resolver =
            SignatureTrustResolver::new(Arc::clone(&pool), Arc::new(KeyEqualsVerifier));

        std::thread::scope(|scope| {
            let writer = {
                let pool = Arc::clone(&pool);
                let (old, new) = (generation("old"), generation("new"));
                scope.spawn(move || {
                    for i in 0..500 {
                        pool.replace_all(if i % 2 == 0 {
                            new.clone()
                        } else {
                            old.clone()
                        });
                    }
                })
            };

            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        // Every resolution sees a whole generation: both
                        // credentials from one pool, never a mix.
                        let candidates = resolver.resolve_candidates(&CriteriaSet::new());
                        assert_eq!(candidates.len(), 2);
                        assert_eq!(candidates[0].entity_id, candidates[1].entity_id);
                    }
                });
            }

            writer.join().unwrap();
        });
    }
}
