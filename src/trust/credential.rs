//! Trusted credentials.

use aws_lc_rs::digest::{digest, SHA256};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Intended usage of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialUsage {
    /// Signature verification.
    Signing,
    /// Encryption key transport.
    Encryption,
    /// Usable for either purpose.
    Any,
}

impl CredentialUsage {
    /// Whether this usage satisfies a requested usage.
    #[must_use]
    pub const fn satisfies(self, requested: Self) -> bool {
        matches!(
            (self, requested),
            (Self::Any, _)
                | (_, Self::Any)
                | (Self::Signing, Self::Signing)
                | (Self::Encryption, Self::Encryption)
        )
    }
}

/// A trusted credential from the metadata/trust layer.
///
/// Key material is carried in the form the verification primitive expects:
/// RSA keys as `RSAPublicKey` DER, EC keys as the uncompressed point octets.
/// When only a certificate is held, the key is extracted on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Entity ID of the credential owner, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// What the credential may be used for.
    pub usage: CredentialUsage,

    /// Raw verification key bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Vec<u8>>,

    /// X.509 certificate (DER) carrying the key, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Vec<u8>>,
}

impl Credential {
    /// Creates a signing credential from raw key bytes.
    #[must_use]
    pub fn signing_key(entity_id: impl Into<String>, public_key: Vec<u8>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            usage: CredentialUsage::Signing,
            public_key: Some(public_key),
            certificate: None,
        }
    }

    /// Creates a signing credential from a certificate.
    #[must_use]
    pub fn signing_certificate(entity_id: impl Into<String>, certificate: Vec<u8>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            usage: CredentialUsage::Signing,
            public_key: None,
            certificate: Some(certificate),
        }
    }

    /// Sets the usage.
    #[must_use]
    pub const fn with_usage(mut self, usage: CredentialUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Attaches a certificate.
    #[must_use]
    pub fn with_certificate(mut self, certificate: Vec<u8>) -> Self {
        self.certificate = Some(certificate);
        self
    }

    /// The verification key bytes for this credential.
    ///
    /// Prefers the explicit key; falls back to extracting the subject public
    /// key from the certificate.
    ///
    /// # Errors
    ///
    /// Returns an error when no key is held or the certificate cannot be
    /// parsed.
    pub fn verification_key(&self) -> Result<Vec<u8>, VerifyError> {
        if let Some(ref key) = self.public_key {
            return Ok(key.clone());
        }
        if let Some(ref cert_der) = self.certificate {
            return extract_subject_public_key(cert_der);
        }
        Err(VerifyError::InvalidKey(
            "credential holds neither key nor certificate".to_string(),
        ))
    }

    /// SHA-256 digest of the certificate, if one is held.
    #[must_use]
    pub fn certificate_digest_sha256(&self) -> Option<Vec<u8>> {
        self.certificate
            .as_ref()
            .map(|der| digest(&SHA256, der).as_ref().to_vec())
    }

    /// Short identifier for log lines, derived from the key material.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let material = self
            .public_key
            .as_deref()
            .or(self.certificate.as_deref())
            .unwrap_or(&[]);
        let hash = digest(&SHA256, material);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&hash.as_ref()[..8])
    }
}

/// Extracts the subject public key octets from an X.509 certificate.
pub(crate) fn extract_subject_public_key(cert_der: &[u8]) -> Result<Vec<u8>, VerifyError> {
    use x509_parser::prelude::*;

    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| VerifyError::InvalidKey(format!("failed to parse certificate: {e}")))?;

    Ok(cert.public_key().subject_public_key.data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_satisfaction() {
        assert!(CredentialUsage::Signing.satisfies(CredentialUsage::Signing));
        assert!(CredentialUsage::Any.satisfies(CredentialUsage::Signing));
        assert!(CredentialUsage::Signing.satisfies(CredentialUsage::Any));
        assert!(!CredentialUsage::Encryption.satisfies(CredentialUsage::Signing));
    }

    #[test]
    fn verification_key_prefers_explicit_key() {
        let cred = Credential::signing_key("https://idp.example.org", vec![1, 2, 3]);
        assert_eq!(cred.verification_key().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn verification_key_fails_without_material() {
        let cred = Credential {
            entity_id: None,
            usage: CredentialUsage::Signing,
            public_key: None,
            certificate: None,
        };
        assert!(cred.verification_key().is_err());
    }

    #[test]
    fn fingerprint_is_stable() {
        let cred = Credential::signing_key("https://idp.example.org", vec![9, 9, 9]);
        assert_eq!(cred.fingerprint(), cred.clone().fingerprint());
        assert!(!cred.fingerprint().is_empty());
    }
}
