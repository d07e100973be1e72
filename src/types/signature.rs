//! Signature and key material carried by an assertion.
//!
//! Canonicalization and digest computation happen in the XML-DSig layer
//! before the engine runs. What arrives here is the canonical signed octets,
//! the signature value, and whatever key hints the document embedded.

use serde::{Deserialize, Serialize};

/// Signature algorithms the engine recognizes.
///
/// Identified by their XML-DSig algorithm URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    RsaSha384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    RsaSha512,
    /// ECDSA over P-256 with SHA-256.
    EcdsaSha256,
    /// ECDSA over P-384 with SHA-384.
    EcdsaSha384,
}

impl SignatureAlgorithm {
    /// Returns the XML-DSig algorithm URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            Self::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            Self::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
        }
    }

    /// Looks up an algorithm by its XML-DSig URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256" => Some(Self::RsaSha256),
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384" => Some(Self::RsaSha384),
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512" => Some(Self::RsaSha512),
            "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256" => Some(Self::EcdsaSha256),
            "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384" => Some(Self::EcdsaSha384),
            _ => None,
        }
    }
}

/// A signature over an assertion, ready for trust evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    /// The signature algorithm.
    pub algorithm: SignatureAlgorithm,

    /// The canonicalized octets the signature covers.
    pub signed_content: Vec<u8>,

    /// The raw signature value.
    pub value: Vec<u8>,

    /// Key material embedded alongside the signature, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_info: Option<KeyInfo>,
}

impl Signature {
    /// Creates a signature record.
    #[must_use]
    pub fn new(algorithm: SignatureAlgorithm, signed_content: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            algorithm,
            signed_content,
            value,
            key_info: None,
        }
    }

    /// Attaches embedded key material.
    #[must_use]
    pub fn with_key_info(mut self, key_info: KeyInfo) -> Self {
        self.key_info = Some(key_info);
        self
    }
}

/// Key material embedded in a document (a KeyInfo element).
///
/// Keys are raw verification-key octets; certificates are X.509 DER.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Embedded public keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<Vec<u8>>,

    /// Embedded certificates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<Vec<u8>>,

    /// SHA-256 digests of certificates referenced without being embedded
    /// (an X509Digest element).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificate_digests_sha256: Vec<Vec<u8>>,
}

impl KeyInfo {
    /// Creates key info holding a single public key.
    #[must_use]
    pub fn from_public_key(key_der: Vec<u8>) -> Self {
        Self {
            public_keys: vec![key_der],
            ..Self::default()
        }
    }

    /// Creates key info holding a single certificate.
    #[must_use]
    pub fn from_certificate(cert_der: Vec<u8>) -> Self {
        Self {
            certificates: vec![cert_der],
            ..Self::default()
        }
    }

    /// Returns true when no key material is present at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty()
            && self.certificates.is_empty()
            && self.certificate_digests_sha256.is_empty()
    }
}
