//! Property tests for FUEL_PATCH application.
//!
//! Instruction streams are generated against a random source while the
//! expected target is computed alongside; applying the stream must
//! reproduce that target byte for byte.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use fuel_formats::fuel_patch::{
    FuelPatchBuilder, FuelPatchError, FuelPatchWriter, FuelPatcher, PatchCompression,
    apply_patch_memory,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::io::Cursor;

#[derive(Debug, Clone)]
enum Op {
    Seek(usize),
    Copy(usize),
    Insert(Vec<u8>),
    Merge(Vec<u8>),
}

fn compression() -> impl Strategy<Value = PatchCompression> {
    prop_oneof![Just(PatchCompression::None), Just(PatchCompression::Zstd)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4096).prop_map(Op::Seek),
        (1usize..600).prop_map(Op::Copy),
        prop::collection::vec(any::<u8>(), 1..300).prop_map(Op::Insert),
        prop::collection::vec(any::<u8>(), 1..300).prop_map(Op::Merge),
    ]
}

/// Encode `ops` against `source`, clamping every source access to bounds
fn encode(source: &[u8], ops: &[Op], compression: PatchCompression) -> (Vec<u8>, Vec<u8>) {
    let mut writer = FuelPatchWriter::new(compression);
    let mut expected = Vec::new();
    let mut pos = 0usize;

    for op in ops {
        match op {
            Op::Seek(to) => {
                let to = to % (source.len() + 1);
                writer.seek(to as i64 - pos as i64).unwrap();
                pos = to;
            }
            Op::Copy(len) => {
                let len = (*len).min(source.len() - pos);
                writer.copy(len as u64).unwrap();
                expected.extend_from_slice(&source[pos..pos + len]);
                pos += len;
            }
            Op::Insert(data) => {
                writer.insert(data).unwrap();
                expected.extend_from_slice(data);
            }
            Op::Merge(deltas) => {
                let len = deltas.len().min(source.len() - pos);
                writer.merge(&deltas[..len]).unwrap();
                expected.extend(
                    source[pos..pos + len]
                        .iter()
                        .zip(deltas)
                        .map(|(s, d)| s.wrapping_add(*d)),
                );
                pos += len;
            }
        }
    }

    (writer.finish().unwrap(), expected)
}

proptest! {
    /// Any valid instruction stream reproduces the simulated target
    #[test]
    fn instruction_stream_round_trip(
        source in prop::collection::vec(any::<u8>(), 0..4096),
        ops in prop::collection::vec(op(), 0..40),
        compression in compression(),
    ) {
        let (patch, expected) = encode(&source, &ops, compression);
        let result = apply_patch_memory(&source, &patch)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result, expected);
    }

    /// Block size only affects memory use, never the output
    #[test]
    fn block_size_does_not_change_output(
        source in prop::collection::vec(any::<u8>(), 0..2048),
        ops in prop::collection::vec(op(), 0..20),
        block_size in 1usize..512,
    ) {
        let (patch, expected) = encode(&source, &ops, PatchCompression::None);
        let mut target = Vec::new();
        let written = FuelPatcher::new(Cursor::new(&source), patch.as_slice(), &mut target)
            .with_block_size(block_size)
            .apply()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(written, expected.len() as u64);
        prop_assert_eq!(target, expected);
    }

    /// Derived patches rebuild arbitrary targets from arbitrary sources
    #[test]
    fn builder_round_trip(
        source in prop::collection::vec(any::<u8>(), 0..4096),
        target in prop::collection::vec(any::<u8>(), 0..4096),
        compression in compression(),
    ) {
        let patch = FuelPatchBuilder::new(&source, &target)
            .with_compression(compression)
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let result = apply_patch_memory(&source, &patch)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result, target);
    }

    /// Similar files produce patches smaller than the target
    #[test]
    fn builder_patches_small_edits_compactly(
        mut target in prop::collection::vec(any::<u8>(), 2048..4096),
        edits in prop::collection::vec((any::<usize>(), any::<u8>()), 1..8),
    ) {
        let source = target.clone();
        for (at, byte) in edits {
            let at = at % target.len();
            target[at] = byte;
        }
        let patch = FuelPatchBuilder::new(&source, &target)
            .with_compression(PatchCompression::None)
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(patch.len() < target.len() / 4);
    }

    /// Unknown compression flags are always rejected
    #[test]
    fn unknown_compression_flag_rejected(flag in 2u8..=255, body in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut patch = vec![flag];
        patch.extend_from_slice(&body);
        let is_invalid_compression = matches!(
            apply_patch_memory(b"source", &patch),
            Err(FuelPatchError::InvalidCompression(Some(f))) if f == flag
        );
        prop_assert!(is_invalid_compression);
    }
}

#[test]
fn merge_underrun_on_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("a.bin");
    std::fs::write(&source_path, b"short").unwrap();

    let mut writer = FuelPatchWriter::new(PatchCompression::Zstd);
    writer.merge(&[1u8; 16]).unwrap();
    let patch = writer.finish().unwrap();

    let source = std::fs::File::open(&source_path).unwrap();
    let mut target = Vec::new();
    let err = FuelPatcher::new(source, patch.as_slice(), &mut target)
        .apply()
        .unwrap_err();
    assert!(matches!(
        err,
        FuelPatchError::MergeLengthMismatch {
            expected: 16,
            source_len: 5,
            patch_len: 16
        }
    ));
    assert!(err.is_corruption_error());
}
