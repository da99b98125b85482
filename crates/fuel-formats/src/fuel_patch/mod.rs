//! FUEL_PATCH binary delta format
//!
//! FUEL_PATCH is the delta encoding served by the distribution service for
//! updated files. A patch rebuilds the new file from the locally installed
//! copy plus a compact instruction stream.
//!
//! # Format Structure
//!
//! ```text
//! FUEL_PATCH:
//! ├── Compression flag (1 byte): 0 = raw, 1 = zstd
//! └── Instruction stream (zstd-framed when flagged), until EOF
//!     ├── Seek   (00): move the source cursor by a signed length
//!     ├── Copy   (01): copy source bytes to the target
//!     ├── Insert (10): copy literal patch bytes to the target
//!     └── Merge  (11): target = source + patch (mod 256), byte-wise
//! ```
//!
//! See [`instruction`] for the length encoding.
//!
//! # Usage Examples
//!
//! ```rust
//! use fuel_formats::fuel_patch::{self, FuelPatchBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let old_data = b"version 1 of the data file".to_vec();
//! let new_data = b"version 2 of the data file, extended".to_vec();
//!
//! let patch = FuelPatchBuilder::new(&old_data, &new_data).build()?;
//! let result = fuel_patch::apply_patch_memory(&old_data, &patch)?;
//! assert_eq!(result, new_data);
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
pub mod instruction;
mod patcher;

pub use builder::{FuelPatchBuilder, FuelPatchWriter};
pub use error::{FuelPatchError, FuelPatchResult};
pub use instruction::{Instruction, Opcode};
pub use patcher::{DEFAULT_BLOCK_SIZE, FuelPatcher, apply_patch_memory};

/// Compression applied to the instruction stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PatchCompression {
    /// Raw instruction stream
    #[default]
    None = 0,
    /// zstd-framed instruction stream
    Zstd = 1,
}

impl TryFrom<u8> for PatchCompression {
    type Error = FuelPatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Zstd),
            other => Err(FuelPatchError::InvalidCompression(Some(other))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_flag_values() {
        assert_eq!(PatchCompression::try_from(0).unwrap(), PatchCompression::None);
        assert_eq!(PatchCompression::try_from(1).unwrap(), PatchCompression::Zstd);
        assert!(PatchCompression::try_from(0xFF).is_err());
        assert_eq!(PatchCompression::Zstd as u8, 1);
    }
}
