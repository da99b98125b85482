//! Error types for cryptographic operations

use thiserror::Error;

/// Errors that can occur during hashing and signature verification
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Hash algorithm name or wire value is not known
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// Signature algorithm is not known
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedSignatureAlgorithm(String),

    /// Public key could not be decoded
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature bytes are not a valid RSA signature encoding
    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    /// Signature did not verify against the signed data
    #[error("Signature verification failed")]
    SignatureMismatch,

    /// Hex digest could not be decoded
    #[error("Invalid hex digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// I/O error while hashing a stream or file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// Check if this error means the signed content must not be trusted
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::SignatureMismatch
                | Self::InvalidSignature(_)
                | Self::UnsupportedSignatureAlgorithm(_)
        )
    }
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
