//! Error types for FUEL_PATCH operations

use thiserror::Error;

/// FUEL_PATCH-specific error types
#[derive(Error, Debug)]
pub enum FuelPatchError {
    /// First patch byte is not a known compression flag, or the patch is empty
    #[error("Invalid patch compression flag: {0:?}")]
    InvalidCompression(Option<u8>),

    /// Escaped length bytes ended before the instruction was complete
    #[error("Truncated {opcode} instruction: expected {expected} length bytes, got {actual}")]
    TruncatedInstruction {
        /// Opcode being decoded
        opcode: &'static str,
        /// Length bytes announced by the opcode byte
        expected: usize,
        /// Length bytes actually available
        actual: usize,
    },

    /// Copy or Insert ran past the end of its input stream
    #[error("Unexpected end of {stream} during {opcode}: {missing} bytes missing")]
    UnexpectedEof {
        /// Opcode being executed
        opcode: &'static str,
        /// Stream that ran dry (`source` or `patch`)
        stream: &'static str,
        /// Bytes still owed when the stream ended
        missing: u64,
    },

    /// Merge could not read the same number of bytes from source and patch
    #[error(
        "Merge length mismatch: wanted {expected} bytes, source gave {source_len}, patch gave {patch_len}"
    )]
    MergeLengthMismatch {
        /// Bytes requested for this block
        expected: usize,
        /// Bytes read from the source stream
        source_len: usize,
        /// Bytes read from the patch stream
        patch_len: usize,
    },

    /// Instruction with a zero length cannot be encoded
    #[error("Cannot encode a zero-length {0} instruction")]
    ZeroLength(&'static str),

    /// Instruction length cannot be represented in the escape encoding
    #[error("Instruction length {0} exceeds the 5-byte escape encoding")]
    LengthTooLarge(u64),

    /// I/O error on one of the streams, including seeks before the source start
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for FUEL_PATCH operations
pub type FuelPatchResult<T> = Result<T, FuelPatchError>;

impl FuelPatchError {
    /// Create an unexpected EOF error for `opcode` reading `stream`
    pub fn unexpected_eof(opcode: &'static str, stream: &'static str, missing: u64) -> Self {
        Self::UnexpectedEof {
            opcode,
            stream,
            missing,
        }
    }

    /// Check if this error indicates a malformed or corrupted patch body
    pub fn is_corruption_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCompression(_)
                | Self::TruncatedInstruction { .. }
                | Self::UnexpectedEof { .. }
                | Self::MergeLengthMismatch { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        assert!(FuelPatchError::InvalidCompression(Some(7)).is_corruption_error());
        assert!(FuelPatchError::unexpected_eof("insert", "patch", 3).is_corruption_error());
        assert!(
            FuelPatchError::MergeLengthMismatch {
                expected: 4,
                source_len: 4,
                patch_len: 1
            }
            .is_corruption_error()
        );
        assert!(!FuelPatchError::Io(std::io::Error::other("disk")).is_corruption_error());
    }

    #[test]
    fn test_error_display() {
        let message = FuelPatchError::unexpected_eof("copy", "source", 12).to_string();
        assert!(message.contains("copy"));
        assert!(message.contains("source"));
        assert!(message.contains("12"));
    }
}
