//! Wire formats of the fuel game distribution pipeline
#![allow(clippy::cast_possible_wrap)] // Protobuf sizes are signed
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::derive_partial_eq_without_eq)] // Generated-style protobuf messages
//!
//! This crate provides symmetric (decoder and encoder) implementations of the
//! formats exchanged with the distribution service, and the pure planning
//! logic that sits between them.
//!
//! # Supported Formats
//!
//! - **Manifest**: signed, LZMA-compressed protobuf file listings
//! - **Patch manifest**: per-pass work list of directories and files to fetch
//! - **FUEL_PATCH**: binary delta format rebuilding files from installed copies
//!
//! # Data Flow
//!
//! ```text
//! raw bytes -> ManifestCodec -> Manifest -> Comparison -> HashPairs
//!           -> (patch lookup) -> PatchManifest -> FuelPatcher
//! ```

#![warn(missing_docs)]

pub mod fuel_patch;
pub mod manifest;
pub mod patch_manifest;

pub use fuel_patch::{FuelPatchError, FuelPatcher};
pub use manifest::{Comparison, Manifest, ManifestCodec, ManifestError};
pub use patch_manifest::{
    HashPair, HashPairs, PatchDescriptor, PatchFile, PatchManifest, PatchType, PlanError,
};
