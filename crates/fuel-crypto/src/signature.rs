//! Manifest signature verification
//!
//! Download manifests are signed with RSA PKCS#1 v1.5 over a SHA-256 digest
//! of the decompressed manifest body. The distribution service's public key
//! is embedded in this crate; tests and alternative deployments inject their
//! own key through [`SignatureVerifier::from_public_key_pem`].

use crate::error::{CryptoError, CryptoResult};
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use sha2::Sha256;
use std::fmt;

/// Public key the distribution service signs download manifests with
pub const EMBEDDED_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA6fSRMUi3VpTtv9P4+KvM
AcAIP4SYbTQfB1ns7vyUjsj8nrF2lGNtQTtGLnrNmM2ElZ2R7VmQtNiRtPMxToIW
Rajin0H0OyzGrHA8P6w96Mj4q1JeORCzJeVFgLOBClCCMmB+5bJBWnJcq/sEMwu9
gGynCeiYNLt7ZMVpL1GOsNjl+yLk7OMMGpMj1JWCVFfgYE9Lud1QZJllFAWhRBoT
wTctAUZTikObFUoBm+KEiCsKIcay4WOybvJwxTNBUl2GL8c+ihrT2ntLPpb9aIJE
/gXU3Ihl5oXe/0P/QN0CRu/ybXWLiGzIYqKIok4nepkdo8V3gWR55K801pOuck0B
awIDAQAB
-----END PUBLIC KEY-----
";

/// Signature scheme declared in a manifest header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256
    #[default]
    Sha256WithRsa,
}

impl SignatureAlgorithm {
    /// Algorithm name as it appears in manifest headers
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256WithRsa => "sha256_with_rsa",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verifies detached manifest signatures against a single RSA public key
#[derive(Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey<Sha256>,
}

impl SignatureVerifier {
    /// Verifier for the embedded distribution service key
    pub fn embedded() -> CryptoResult<Self> {
        Self::from_public_key_pem(EMBEDDED_PUBLIC_KEY)
    }

    /// Verifier for a PEM-encoded SubjectPublicKeyInfo key
    pub fn from_public_key_pem(pem: &str) -> CryptoResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::from_public_key(key))
    }

    /// Verifier for an already decoded RSA public key
    pub fn from_public_key(key: RsaPublicKey) -> Self {
        Self {
            key: VerifyingKey::<Sha256>::new(key),
        }
    }

    /// Verify `signature` over `data`
    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        data: &[u8],
        signature: &[u8],
    ) -> CryptoResult<()> {
        match algorithm {
            SignatureAlgorithm::Sha256WithRsa => {
                let signature = Signature::try_from(signature)
                    .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
                self.key
                    .verify(data, &signature)
                    .map_err(|_| CryptoError::SignatureMismatch)
            }
        }
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{SignatureEncoding, Signer};

    const TEST_PRIVATE_KEY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../fuel-formats/test_fixtures/manifest_signing_key.pem"
    ));
    const TEST_PUBLIC_KEY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../fuel-formats/test_fixtures/manifest_signing_key.pub.pem"
    ));

    fn sign(data: &[u8]) -> Vec<u8> {
        let key = RsaPrivateKey::from_pkcs1_pem(TEST_PRIVATE_KEY).unwrap();
        SigningKey::<Sha256>::new(key).sign(data).to_vec()
    }

    #[test]
    fn test_embedded_key_parses() {
        assert!(SignatureVerifier::embedded().is_ok());
    }

    #[test]
    fn test_valid_signature_verifies() {
        let verifier = SignatureVerifier::from_public_key_pem(TEST_PUBLIC_KEY).unwrap();
        let signature = sign(b"manifest body");
        verifier
            .verify(SignatureAlgorithm::Sha256WithRsa, b"manifest body", &signature)
            .unwrap();
    }

    #[test]
    fn test_tampered_data_is_rejected() {
        let verifier = SignatureVerifier::from_public_key_pem(TEST_PUBLIC_KEY).unwrap();
        let signature = sign(b"manifest body");
        let err = verifier
            .verify(SignatureAlgorithm::Sha256WithRsa, b"manifest bodY", &signature)
            .unwrap_err();
        assert!(err.is_verification_failure());
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let verifier = SignatureVerifier::embedded().unwrap();
        let signature = sign(b"manifest body");
        assert!(
            verifier
                .verify(SignatureAlgorithm::Sha256WithRsa, b"manifest body", &signature)
                .is_err()
        );
    }

    #[test]
    fn test_bad_pem() {
        assert!(matches!(
            SignatureVerifier::from_public_key_pem("not a key"),
            Err(CryptoError::InvalidPublicKey(_))
        ));
    }
}
