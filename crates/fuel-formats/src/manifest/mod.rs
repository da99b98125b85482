//! Signed download manifests
//!
//! A download manifest lists every file of one game version together with
//! its content hash. The distribution service publishes it as a signed,
//! optionally LZMA-compressed protobuf blob.
//!
//! # Format Structure
//!
//! ```text
//! Manifest blob:
//! ├── Header length (4 bytes, big-endian)
//! ├── ManifestHeader (protobuf)
//! │   ├── compression: none | lzma
//! │   ├── hash: optional body digest
//! │   └── signature: sha256_with_rsa over the decompressed body
//! └── Body (compressed protobuf Manifest)
//!     └── packages[]
//!         ├── name
//!         ├── files[]: path, mode, size, created, hash, hidden, system
//!         └── dirs[]:  path, mode
//! ```
//!
//! Paths use `\` as separator. Consumers only look at the first package.

mod builder;
mod codec;
mod comparison;
mod error;
mod model;
#[allow(missing_docs)]
pub mod proto;

pub use builder::ManifestEncoder;
pub use codec::{HEADER_LENGTH_SIZE, ManifestCodec, split_header};
pub use comparison::Comparison;
pub use error::{ManifestError, ManifestResult};
pub use model::{
    CompressionAlgorithm, DirEntry, FileEntry, ManifestHeader, ManifestSignature, Package,
};

/// A verified download manifest
///
/// Keeps the exact blob it was decoded from so the installer can persist
/// the bytes that were verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    header: ManifestHeader,
    packages: Vec<Package>,
    raw: Vec<u8>,
}

impl Manifest {
    pub(crate) fn from_parts(header: ManifestHeader, packages: Vec<Package>, raw: Vec<u8>) -> Self {
        Self {
            header,
            packages,
            raw,
        }
    }

    /// Decoded header
    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    /// All packages in publication order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Files of the first package; empty when there are no packages
    pub fn files(&self) -> &[FileEntry] {
        self.packages.first().map_or(&[], |p| p.files.as_slice())
    }

    /// Directories of the first package
    pub fn dirs(&self) -> &[DirEntry] {
        self.packages.first().map_or(&[], |p| p.dirs.as_slice())
    }

    /// Sum of the sizes of the first package's files
    pub fn total_size(&self) -> u64 {
        self.files().iter().map(|f| f.size.max(0) as u64).sum()
    }

    /// The verified blob this manifest was decoded from
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::test_support::{encoder, test_codec};
    use super::*;
    use fuel_crypto::{ContentHash, HashAlgorithm};

    #[test]
    fn test_empty_manifest_has_no_files() {
        let raw = encoder().encode(&[]).unwrap();
        let manifest = test_codec().decode(&raw).unwrap();
        assert!(manifest.packages().is_empty());
        assert!(manifest.files().is_empty());
        assert!(manifest.dirs().is_empty());
        assert_eq!(manifest.total_size(), 0);
    }

    #[test]
    fn test_total_size_uses_first_package() {
        let hash = ContentHash::compute(HashAlgorithm::Sha256, b"x");
        let packages = vec![
            Package {
                name: "main".to_string(),
                files: vec![
                    FileEntry::new("a", 10, hash.clone()),
                    FileEntry::new("b", 32, hash.clone()),
                ],
                dirs: vec![DirEntry {
                    path: "data".to_string(),
                    mode: 0o755,
                }],
            },
            Package {
                name: "extra".to_string(),
                files: vec![FileEntry::new("c", 1000, hash)],
                dirs: Vec::new(),
            },
        ];
        let manifest = test_codec()
            .decode(&encoder().encode(&packages).unwrap())
            .unwrap();
        assert_eq!(manifest.total_size(), 42);
        assert_eq!(manifest.dirs().len(), 1);
        assert_eq!(manifest.packages()[1].name, "extra");
    }
}
