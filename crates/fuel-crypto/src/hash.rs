//! Content hashes used to verify manifest files, patch bodies and installed files
//!
//! Every file listed in a manifest carries a [`ContentHash`]: the digest
//! algorithm plus the raw digest bytes. Patch descriptors returned by the
//! distribution service use the same representation for patch bodies.
//!
//! Two algorithms are known:
//!
//! - **SHA-256**: the algorithm used by practically every manifest
//! - **SHAKE128**: extendable output; the digest length is taken from the
//!   expected value, so verification always compares equal-length outputs

use crate::error::{CryptoError, CryptoResult};
use sha2::{Digest, Sha256};
use sha3::Shake128;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Default SHAKE128 output length when no expected digest is available
pub const DEFAULT_SHAKE128_LEN: usize = 32;

/// Read buffer used when hashing files
const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm of a content hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum HashAlgorithm {
    /// SHA-256 (32-byte digest)
    #[default]
    Sha256,
    /// SHAKE128 extendable-output function
    Shake128,
}

impl HashAlgorithm {
    /// Lowercase algorithm name as used in manifests
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Shake128 => "shake128",
        }
    }

    /// Uppercase algorithm name as used by the patch lookup service
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Shake128 => "SHAKE128",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "shake128" | "shake-128" => Ok(Self::Shake128),
            _ => Err(CryptoError::UnsupportedHashAlgorithm(s.to_string())),
        }
    }
}

/// A content digest together with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    algorithm: HashAlgorithm,
    value: Vec<u8>,
}

impl ContentHash {
    /// Create a content hash from raw digest bytes
    pub fn new(algorithm: HashAlgorithm, value: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }

    /// Parse a content hash from a hex string
    pub fn from_hex(algorithm: HashAlgorithm, hex: &str) -> CryptoResult<Self> {
        Ok(Self::new(algorithm, hex::decode(hex)?))
    }

    /// Compute the hash of in-memory data
    ///
    /// SHAKE128 output uses [`DEFAULT_SHAKE128_LEN`] bytes.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        let mut checksum = Checksum::new(algorithm, DEFAULT_SHAKE128_LEN);
        checksum.update(data);
        checksum.finalize()
    }

    /// Digest algorithm
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Lowercase hex rendering of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Start an incremental checksum producing a digest comparable to this one
    pub fn checksum(&self) -> Checksum {
        Checksum::new(self.algorithm, self.value.len())
    }

    /// Check whether `data` hashes to this digest
    pub fn matches(&self, data: &[u8]) -> bool {
        let mut checksum = self.checksum();
        checksum.update(data);
        checksum.finalize() == *self
    }

    /// Check whether everything readable from `reader` hashes to this digest
    pub fn matches_reader<R: Read>(&self, reader: &mut R) -> CryptoResult<bool> {
        let mut checksum = self.checksum();
        io::copy(reader, &mut checksum)?;
        Ok(checksum.finalize() == *self)
    }

    /// Check whether the file at `path` hashes to this digest
    ///
    /// A missing file is an error, not a mismatch.
    pub fn matches_file(&self, path: &Path) -> CryptoResult<bool> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(FILE_BUFFER_SIZE, file);
        self.matches_reader(&mut reader)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

enum HasherState {
    Sha256(Sha256),
    Shake128(Shake128, usize),
}

/// Incremental checksum over streamed data
///
/// Implements [`Write`] so it can be fed with [`std::io::copy`].
pub struct Checksum {
    algorithm: HashAlgorithm,
    state: HasherState,
}

impl Checksum {
    /// Start a checksum; `output_len` only applies to SHAKE128
    pub fn new(algorithm: HashAlgorithm, output_len: usize) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Shake128 => {
                HasherState::Shake128(Shake128::default(), output_len.max(1))
            }
        };
        Self { algorithm, state }
    }

    /// Feed more data into the checksum
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(hasher) => Digest::update(hasher, data),
            HasherState::Shake128(hasher, _) => Update::update(hasher, data),
        }
    }

    /// Finish the checksum
    pub fn finalize(self) -> ContentHash {
        let value = match self.state {
            HasherState::Sha256(hasher) => hasher.finalize().to_vec(),
            HasherState::Shake128(hasher, len) => {
                let mut out = vec![0u8; len];
                XofReader::read(&mut hasher.finalize_xof(), &mut out);
                out
            }
        };
        ContentHash::new(self.algorithm, value)
    }
}

impl Write for Checksum {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const HELLO_SHA256: &str = "185f8db32271fe25f561a6fc938b2e264306ec304eda518007d1764826381969";

    #[test]
    fn test_sha256_known_vector() {
        let hash = ContentHash::compute(HashAlgorithm::Sha256, b"Hello");
        assert_eq!(hash.to_hex(), HELLO_SHA256);
        assert_eq!(hash.algorithm(), HashAlgorithm::Sha256);
    }

    #[test]
    fn test_shake128_known_vector() {
        // SHAKE128("", 256 bits)
        let hash = ContentHash::compute(HashAlgorithm::Shake128, b"");
        assert_eq!(
            hash.to_hex(),
            "7f9c2ba4e88f827d616045507605853ed73b8093f6efbc88eb1a6eacfa66ef26"
        );
    }

    #[test]
    fn test_shake128_uses_expected_length() {
        let long = ContentHash::compute(HashAlgorithm::Shake128, b"data");
        let short = ContentHash::new(HashAlgorithm::Shake128, long.value()[..16].to_vec());
        assert!(short.matches(b"data"));
        assert!(long.matches(b"data"));
    }

    #[test]
    fn test_matches_reader_and_mismatch() {
        let expected = ContentHash::from_hex(HashAlgorithm::Sha256, HELLO_SHA256).unwrap();
        assert!(expected.matches_reader(&mut Cursor::new(b"Hello")).unwrap());
        assert!(!expected.matches_reader(&mut Cursor::new(b"hello")).unwrap());
    }

    #[test]
    fn test_matches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        std::fs::write(&path, b"Hello").unwrap();

        let expected = ContentHash::from_hex(HashAlgorithm::Sha256, HELLO_SHA256).unwrap();
        assert!(expected.matches_file(&path).unwrap());

        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            expected.matches_file(&missing),
            Err(CryptoError::Io(_))
        ));
    }

    #[test]
    fn test_incremental_equals_one_shot() {
        let mut checksum = Checksum::new(HashAlgorithm::Sha256, 0);
        checksum.update(b"Hel");
        checksum.update(b"lo");
        assert_eq!(
            checksum.finalize(),
            ContentHash::compute(HashAlgorithm::Sha256, b"Hello")
        );
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("shake128".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Shake128);
        assert!("md5".parse::<HashAlgorithm>().is_err());
        assert_eq!(HashAlgorithm::Sha256.wire_name(), "SHA256");
        assert_eq!(HashAlgorithm::Shake128.to_string(), "shake128");
    }

    #[test]
    fn test_algorithm_is_part_of_identity() {
        let sha = ContentHash::new(HashAlgorithm::Sha256, vec![1, 2, 3]);
        let shake = ContentHash::new(HashAlgorithm::Shake128, vec![1, 2, 3]);
        assert_ne!(sha, shake);
    }
}
