//! FUEL_PATCH creation
//!
//! [`FuelPatchWriter`] emits an explicit instruction sequence.
//! [`FuelPatchBuilder`] derives one from a source/target pair: positions
//! that agree become Copy runs, differing runs become Merge deltas, and any
//! target bytes beyond the source end become an Insert.

use crate::fuel_patch::{
    PatchCompression,
    error::FuelPatchResult,
    instruction::Instruction,
};
use std::io::Write;

/// zstd level used for compressed patches
const ZSTD_LEVEL: i32 = 3;

/// Equal runs shorter than this stay inside the surrounding Merge
const MIN_COPY_RUN: usize = 8;

/// Writer for FUEL_PATCH instruction streams
///
/// # Examples
///
/// ```rust
/// use fuel_formats::fuel_patch::{FuelPatchWriter, PatchCompression, apply_patch_memory};
///
/// let mut writer = FuelPatchWriter::new(PatchCompression::Zstd);
/// writer.seek(2).unwrap().copy(3).unwrap().insert(b"!").unwrap();
/// let patch = writer.finish().unwrap();
///
/// assert_eq!(apply_patch_memory(b"abcdef", &patch).unwrap(), b"cde!");
/// ```
#[derive(Debug, Clone)]
pub struct FuelPatchWriter {
    compression: PatchCompression,
    body: Vec<u8>,
}

impl FuelPatchWriter {
    /// Start an empty patch
    pub fn new(compression: PatchCompression) -> Self {
        Self {
            compression,
            body: Vec::new(),
        }
    }

    /// Move the source cursor; a zero offset emits nothing
    pub fn seek(&mut self, offset: i64) -> FuelPatchResult<&mut Self> {
        if offset != 0 {
            Instruction::Seek(offset).write_to(&mut self.body)?;
        }
        Ok(self)
    }

    /// Copy `length` bytes from the source
    pub fn copy(&mut self, length: u64) -> FuelPatchResult<&mut Self> {
        if length > 0 {
            Instruction::Copy(length).write_to(&mut self.body)?;
        }
        Ok(self)
    }

    /// Insert literal bytes
    pub fn insert(&mut self, data: &[u8]) -> FuelPatchResult<&mut Self> {
        if !data.is_empty() {
            Instruction::Insert(data.len() as u64).write_to(&mut self.body)?;
            self.body.extend_from_slice(data);
        }
        Ok(self)
    }

    /// Add `deltas` byte-wise to the next source bytes
    pub fn merge(&mut self, deltas: &[u8]) -> FuelPatchResult<&mut Self> {
        if !deltas.is_empty() {
            Instruction::Merge(deltas.len() as u64).write_to(&mut self.body)?;
            self.body.extend_from_slice(deltas);
        }
        Ok(self)
    }

    /// Size of the uncompressed instruction stream
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Produce the patch: compression flag followed by the instruction stream
    pub fn finish(self) -> FuelPatchResult<Vec<u8>> {
        let mut patch = Vec::with_capacity(self.body.len() + 1);
        patch.push(self.compression as u8);
        match self.compression {
            PatchCompression::None => patch.extend_from_slice(&self.body),
            PatchCompression::Zstd => {
                let mut encoder = zstd::stream::write::Encoder::new(&mut patch, ZSTD_LEVEL)?;
                encoder.write_all(&self.body)?;
                encoder.finish()?;
            }
        }
        Ok(patch)
    }
}

/// Builder deriving a FUEL_PATCH from source and target data
///
/// # Examples
///
/// ```rust
/// use fuel_formats::fuel_patch::{FuelPatchBuilder, apply_patch_memory};
///
/// let source = b"Hello, World! Some shared tail".to_vec();
/// let target = b"Hello, Fuel!! Some shared tail and more".to_vec();
///
/// let patch = FuelPatchBuilder::new(&source, &target).build().unwrap();
/// assert_eq!(apply_patch_memory(&source, &patch).unwrap(), target);
/// ```
#[derive(Debug, Clone)]
pub struct FuelPatchBuilder<'a> {
    source: &'a [u8],
    target: &'a [u8],
    compression: PatchCompression,
}

impl<'a> FuelPatchBuilder<'a> {
    /// Create a builder for transforming `source` into `target`
    pub fn new(source: &'a [u8], target: &'a [u8]) -> Self {
        Self {
            source,
            target,
            compression: PatchCompression::Zstd,
        }
    }

    /// Set the patch compression (default: zstd)
    pub fn with_compression(mut self, compression: PatchCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Build the patch
    pub fn build(&self) -> FuelPatchResult<Vec<u8>> {
        let mut writer = FuelPatchWriter::new(self.compression);
        let overlap = self.source.len().min(self.target.len());

        let mut pos = 0;
        while pos < overlap {
            let equal = common_run(&self.source[pos..overlap], &self.target[pos..overlap]);
            if equal >= MIN_COPY_RUN || (equal > 0 && pos + equal == overlap) {
                writer.copy(equal as u64)?;
                pos += equal;
                continue;
            }

            let end = merge_run_end(self.source, self.target, pos, overlap);
            let deltas: Vec<u8> = self.source[pos..end]
                .iter()
                .zip(&self.target[pos..end])
                .map(|(s, t)| t.wrapping_sub(*s))
                .collect();
            writer.merge(&deltas)?;
            pos = end;
        }

        writer.insert(&self.target[overlap..])?;
        writer.finish()
    }
}

/// Length of the equal prefix of `a` and `b`
fn common_run(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// End of a Merge region starting at `start`: the next equal run long enough
/// to be worth a Copy, or `overlap`
fn merge_run_end(source: &[u8], target: &[u8], start: usize, overlap: usize) -> usize {
    let mut pos = start;
    while pos < overlap {
        let equal = common_run(&source[pos..overlap], &target[pos..overlap]);
        if equal >= MIN_COPY_RUN {
            return pos;
        }
        pos += equal + 1;
    }
    overlap
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fuel_patch::apply_patch_memory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_writer_raw_layout() {
        let mut writer = FuelPatchWriter::new(PatchCompression::None);
        writer.copy(5).unwrap().insert(b"xyz").unwrap().seek(0).unwrap();
        assert_eq!(writer.body_len(), 5);
        assert_eq!(writer.finish().unwrap(), vec![0, 0x44, 0x82, b'x', b'y', b'z']);
    }

    #[test]
    fn test_builder_identical_data_is_single_copy() {
        let data = vec![42u8; 4096];
        let patch = FuelPatchBuilder::new(&data, &data)
            .with_compression(PatchCompression::None)
            .build()
            .unwrap();
        // flag + one escaped Copy
        assert_eq!(patch, vec![0, 0x7C, 0x0F, 0xFF]);
    }

    #[test]
    fn test_builder_growing_and_shrinking_targets() {
        let source: Vec<u8> = (0..200u8).collect();
        let mut grown = source.clone();
        grown[50] ^= 0xAA;
        grown.extend_from_slice(b"appended");
        let shrunk = source[..120].to_vec();

        for target in [grown, shrunk, Vec::new()] {
            let patch = FuelPatchBuilder::new(&source, &target).build().unwrap();
            assert_eq!(apply_patch_memory(&source, &patch).unwrap(), target);
        }
    }

    #[test]
    fn test_builder_empty_source() {
        let patch = FuelPatchBuilder::new(&[], b"brand new").build().unwrap();
        assert_eq!(apply_patch_memory(&[], &patch).unwrap(), b"brand new");
    }
}
