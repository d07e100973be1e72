//! Delegated signature verification primitive.
//!
//! The trust resolver owns candidate selection; the byte-level cryptography
//! lives behind [`SignatureVerifier`] so the XML-DSig layer (or a test
//! double) can supply it.

use aws_lc_rs::signature::{
    UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1,
    RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
};

use crate::error::VerifyError;
use crate::trust::Credential;
use crate::types::SignatureAlgorithm;

/// Cryptographic signature verification.
///
/// `Ok(false)` means the key material was usable but the signature did not
/// verify; `Err` means the credential or algorithm could not be used at all.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies `signature` over `data` with the credential's key.
    ///
    /// # Errors
    ///
    /// Returns an error when the credential's key material is unusable or
    /// the algorithm is unsupported.
    fn verify(
        &self,
        credential: &Credential,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, VerifyError>;
}

/// Verifier backed by aws-lc-rs.
///
/// Expects RSA keys as `RSAPublicKey` DER and EC keys as uncompressed point
/// octets, which is what [`Credential::verification_key`] yields for both
/// raw keys and certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsLcVerifier;

impl AwsLcVerifier {
    const fn verification_algorithm(
        algorithm: SignatureAlgorithm,
    ) -> &'static dyn VerificationAlgorithm {
        match algorithm {
            SignatureAlgorithm::RsaSha256 => &RSA_PKCS1_2048_8192_SHA256,
            SignatureAlgorithm::RsaSha384 => &RSA_PKCS1_2048_8192_SHA384,
            SignatureAlgorithm::RsaSha512 => &RSA_PKCS1_2048_8192_SHA512,
            SignatureAlgorithm::EcdsaSha256 => &ECDSA_P256_SHA256_ASN1,
            SignatureAlgorithm::EcdsaSha384 => &ECDSA_P384_SHA384_ASN1,
        }
    }
}

impl SignatureVerifier for AwsLcVerifier {
    fn verify(
        &self,
        credential: &Credential,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, VerifyError> {
        let key_bytes = credential.verification_key()?;
        let key = UnparsedPublicKey::new(Self::verification_algorithm(algorithm), &key_bytes);
        Ok(key.verify(data, signature).is_ok())
    }
}
