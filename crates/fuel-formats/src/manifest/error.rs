//! Error types for download manifest decoding

use fuel_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while decoding or encoding a download manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Blob is shorter than its length prefix announces
    #[error("Truncated manifest: need {needed} bytes, got {available}")]
    Truncated {
        /// Bytes required by the length prefix
        needed: usize,
        /// Bytes present
        available: usize,
    },

    /// Header protobuf could not be decoded
    #[error("Invalid manifest header: {0}")]
    InvalidHeader(prost::DecodeError),

    /// Header or body names an algorithm this decoder does not know
    #[error("Unsupported {kind} algorithm value: {value}")]
    UnsupportedAlgorithm {
        /// Which algorithm field (`compression`, `hash`)
        kind: &'static str,
        /// Raw protobuf enum value
        value: i32,
    },

    /// Signature is missing, of an unknown scheme, or does not verify
    #[error("Manifest signature invalid: {0}")]
    SignatureInvalid(String),

    /// Body could not be decompressed
    #[error("Manifest decompression failed: {0}")]
    Decompression(std::io::Error),

    /// Verified body protobuf could not be decoded
    #[error("Invalid manifest body: {0}")]
    Decode(prost::DecodeError),

    /// A required field is absent
    #[error("Manifest is missing required field: {0}")]
    MissingField(&'static str),

    /// Verification key could not be loaded
    #[error("Manifest verification key unusable: {0}")]
    Key(#[source] CryptoError),

    /// Encoding failed (signing or compression)
    #[error("Manifest encoding failed: {0}")]
    Encode(String),
}

/// Result type for manifest operations
pub type ManifestResult<T> = Result<T, ManifestError>;

impl ManifestError {
    /// Create a signature error from a reason
    pub fn signature_invalid<S: Into<String>>(reason: S) -> Self {
        Self::SignatureInvalid(reason.into())
    }

    /// Check if the manifest must not be trusted because its signature failed
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::SignatureInvalid(_))
    }

    /// Check if the blob itself is malformed
    pub fn is_corruption_error(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::InvalidHeader(_)
                | Self::Decompression(_)
                | Self::Decode(_)
                | Self::MissingField(_)
        )
    }
}

impl From<CryptoError> for ManifestError {
    fn from(error: CryptoError) -> Self {
        if error.is_verification_failure() {
            Self::SignatureInvalid(error.to_string())
        } else {
            Self::Key(error)
        }
    }
}
