//! Typed download manifest model
//!
//! Conversions from the wire messages fail closed: a file without a path or
//! hash value is rejected, and unknown enum values are reported instead of
//! being mapped to a default.

use crate::manifest::error::{ManifestError, ManifestResult};
use crate::manifest::proto;
use fuel_crypto::{ContentHash, HashAlgorithm, SignatureAlgorithm};

/// Compression of the manifest body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionAlgorithm {
    /// Body is stored as-is
    #[default]
    None,
    /// Body is an LZMA (`.xz` or legacy `.lzma`) stream
    Lzma,
}

impl CompressionAlgorithm {
    pub(crate) fn from_proto(value: i32) -> ManifestResult<Self> {
        match proto::CompressionAlgorithm::try_from(value) {
            Ok(proto::CompressionAlgorithm::None) => Ok(Self::None),
            Ok(proto::CompressionAlgorithm::Lzma) => Ok(Self::Lzma),
            Err(_) => Err(ManifestError::UnsupportedAlgorithm {
                kind: "compression",
                value,
            }),
        }
    }

    pub(crate) fn to_proto(self) -> proto::CompressionAlgorithm {
        match self {
            Self::None => proto::CompressionAlgorithm::None,
            Self::Lzma => proto::CompressionAlgorithm::Lzma,
        }
    }
}

/// Signature block of a manifest header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSignature {
    /// Signature scheme
    pub algorithm: SignatureAlgorithm,
    /// Raw signature bytes
    pub value: Vec<u8>,
}

/// Decoded manifest header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHeader {
    /// Body compression
    pub compression: CompressionAlgorithm,
    /// Optional digest of the body
    pub hash: Option<ContentHash>,
    /// Body signature
    pub signature: ManifestSignature,
}

impl TryFrom<proto::ManifestHeader> for ManifestHeader {
    type Error = ManifestError;

    fn try_from(header: proto::ManifestHeader) -> ManifestResult<Self> {
        let compression = match header.compression {
            Some(settings) => CompressionAlgorithm::from_proto(settings.algorithm)?,
            None => CompressionAlgorithm::None,
        };

        let signature = header
            .signature
            .ok_or_else(|| ManifestError::signature_invalid("header carries no signature"))?;
        let algorithm = match signature.algorithm.map(proto::SignatureAlgorithm::try_from) {
            None | Some(Ok(proto::SignatureAlgorithm::Sha256WithRsa)) => {
                SignatureAlgorithm::Sha256WithRsa
            }
            Some(Err(e)) => {
                return Err(ManifestError::signature_invalid(format!(
                    "unknown signature algorithm {}",
                    e.0
                )));
            }
        };
        let value = signature
            .value
            .ok_or_else(|| ManifestError::signature_invalid("signature value is empty"))?;

        Ok(Self {
            compression,
            hash: header.hash.map(content_hash_from_proto).transpose()?,
            signature: ManifestSignature { algorithm, value },
        })
    }
}

impl From<&ManifestHeader> for proto::ManifestHeader {
    fn from(header: &ManifestHeader) -> Self {
        Self {
            compression: Some(proto::CompressionSettings {
                algorithm: header.compression.to_proto() as i32,
            }),
            hash: header.hash.as_ref().map(content_hash_to_proto),
            signature: Some(proto::Signature {
                algorithm: Some(proto::SignatureAlgorithm::Sha256WithRsa as i32),
                value: Some(header.signature.value.clone()),
            }),
        }
    }
}

/// A file listed in a manifest package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Backslash-separated path relative to the install root
    pub path: String,
    /// Unix permission bits
    pub mode: u32,
    /// File size in bytes
    pub size: i64,
    /// Creation timestamp as published
    pub created: Option<String>,
    /// Content hash of the complete file
    pub hash: ContentHash,
    /// Windows hidden attribute
    pub hidden: bool,
    /// Windows system attribute
    pub system: bool,
}

impl FileEntry {
    /// Create an entry with default attributes
    pub fn new(path: impl Into<String>, size: i64, hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            mode: 0,
            size,
            created: None,
            hash,
            hidden: false,
            system: false,
        }
    }
}

impl TryFrom<proto::File> for FileEntry {
    type Error = ManifestError;

    fn try_from(file: proto::File) -> ManifestResult<Self> {
        let path = file.path.ok_or(ManifestError::MissingField("file.path"))?;
        let hash = file.hash.ok_or(ManifestError::MissingField("file.hash"))?;
        Ok(Self {
            path,
            mode: file.mode.unwrap_or_default(),
            size: file.size.unwrap_or_default(),
            created: file.created,
            hash: content_hash_from_proto(hash)?,
            hidden: file.hidden.unwrap_or_default(),
            system: file.system.unwrap_or_default(),
        })
    }
}

impl From<&FileEntry> for proto::File {
    fn from(file: &FileEntry) -> Self {
        Self {
            path: Some(file.path.clone()),
            mode: Some(file.mode),
            size: Some(file.size),
            created: file.created.clone(),
            hash: Some(content_hash_to_proto(&file.hash)),
            hidden: Some(file.hidden),
            system: Some(file.system),
        }
    }
}

/// A directory listed in a manifest package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Backslash-separated path relative to the install root
    pub path: String,
    /// Unix permission bits
    pub mode: u32,
}

impl TryFrom<proto::Dir> for DirEntry {
    type Error = ManifestError;

    fn try_from(dir: proto::Dir) -> ManifestResult<Self> {
        Ok(Self {
            path: dir.path.ok_or(ManifestError::MissingField("dir.path"))?,
            mode: dir.mode.unwrap_or_default(),
        })
    }
}

impl From<&DirEntry> for proto::Dir {
    fn from(dir: &DirEntry) -> Self {
        Self {
            path: Some(dir.path.clone()),
            mode: Some(dir.mode),
        }
    }
}

/// A named group of files and directories
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Package {
    /// Package name
    pub name: String,
    /// Files in publication order
    pub files: Vec<FileEntry>,
    /// Directories in publication order
    pub dirs: Vec<DirEntry>,
}

impl TryFrom<proto::Package> for Package {
    type Error = ManifestError;

    fn try_from(package: proto::Package) -> ManifestResult<Self> {
        Ok(Self {
            name: package.name.unwrap_or_default(),
            files: package
                .files
                .into_iter()
                .map(FileEntry::try_from)
                .collect::<ManifestResult<_>>()?,
            dirs: package
                .dirs
                .into_iter()
                .map(DirEntry::try_from)
                .collect::<ManifestResult<_>>()?,
        })
    }
}

impl From<&Package> for proto::Package {
    fn from(package: &Package) -> Self {
        Self {
            name: Some(package.name.clone()),
            files: package.files.iter().map(proto::File::from).collect(),
            dirs: package.dirs.iter().map(proto::Dir::from).collect(),
        }
    }
}

fn content_hash_from_proto(hash: proto::Hash) -> ManifestResult<ContentHash> {
    let algorithm = match hash.algorithm.map(proto::HashAlgorithm::try_from) {
        None | Some(Ok(proto::HashAlgorithm::Sha256)) => HashAlgorithm::Sha256,
        Some(Ok(proto::HashAlgorithm::Shake128)) => HashAlgorithm::Shake128,
        Some(Err(e)) => {
            return Err(ManifestError::UnsupportedAlgorithm {
                kind: "hash",
                value: e.0,
            });
        }
    };
    let value = hash.value.ok_or(ManifestError::MissingField("hash.value"))?;
    Ok(ContentHash::new(algorithm, value))
}

fn content_hash_to_proto(hash: &ContentHash) -> proto::Hash {
    let algorithm = match hash.algorithm() {
        HashAlgorithm::Sha256 => proto::HashAlgorithm::Sha256,
        HashAlgorithm::Shake128 => proto::HashAlgorithm::Shake128,
    };
    proto::Hash {
        algorithm: Some(algorithm as i32),
        value: Some(hash.value().to_vec()),
    }
}
