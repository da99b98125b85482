//! Download manifest encoding
//!
//! Produces blobs in the same layout [`ManifestCodec`](super::ManifestCodec)
//! decodes, signed with a caller-supplied RSA key. Mostly used to create
//! fixtures and to mirror a publisher in tests.

use crate::manifest::{
    error::{ManifestError, ManifestResult},
    model::{CompressionAlgorithm, Package},
    proto,
};
use prost::Message;
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Digest, Sha256};
use std::io::Write;
use xz2::write::XzEncoder;

/// xz preset used for LZMA bodies
const XZ_PRESET: u32 = 6;

/// Encoder for signed download manifests
///
/// # Examples
///
/// ```rust,no_run
/// use fuel_formats::manifest::{ManifestEncoder, Package};
/// use rsa::RsaPrivateKey;
///
/// # fn example(key: RsaPrivateKey) -> Result<(), Box<dyn std::error::Error>> {
/// let raw = ManifestEncoder::new(key).encode(&[Package::default()])?;
/// std::fs::write("manifest.raw", raw)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ManifestEncoder {
    signing_key: SigningKey<Sha256>,
    compression: CompressionAlgorithm,
}

impl ManifestEncoder {
    /// Create an encoder signing with `key`; bodies are LZMA compressed
    pub fn new(key: RsaPrivateKey) -> Self {
        Self {
            signing_key: SigningKey::<Sha256>::new(key),
            compression: CompressionAlgorithm::Lzma,
        }
    }

    /// Set the body compression (default: LZMA)
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Serialize, sign and compress `packages` into a manifest blob
    pub fn encode(&self, packages: &[Package]) -> ManifestResult<Vec<u8>> {
        let body = proto::Manifest {
            packages: packages.iter().map(proto::Package::from).collect(),
        }
        .encode_to_vec();

        let signature = self
            .signing_key
            .try_sign(&body)
            .map_err(|e| ManifestError::Encode(e.to_string()))?;

        let header = proto::ManifestHeader {
            compression: Some(proto::CompressionSettings {
                algorithm: self.compression.to_proto() as i32,
            }),
            hash: Some(proto::Hash {
                algorithm: Some(proto::HashAlgorithm::Sha256 as i32),
                value: Some(Sha256::digest(&body).to_vec()),
            }),
            signature: Some(proto::Signature {
                algorithm: Some(proto::SignatureAlgorithm::Sha256WithRsa as i32),
                value: Some(signature.to_vec()),
            }),
        };

        let compressed = match self.compression {
            CompressionAlgorithm::None => body,
            CompressionAlgorithm::Lzma => {
                compress_xz(&body).map_err(|e| ManifestError::Encode(e.to_string()))?
            }
        };

        Ok(Self::assemble(&header, &compressed))
    }

    /// Join a header message and an already compressed body
    pub fn assemble(header: &proto::ManifestHeader, body: &[u8]) -> Vec<u8> {
        let header = header.encode_to_vec();
        let mut out = Vec::with_capacity(4 + header.len() + body.len());
        out.extend_from_slice(&(header.len() as u32).to_be_bytes());
        out.extend_from_slice(&header);
        out.extend_from_slice(body);
        out
    }
}

fn compress_xz(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = XzEncoder::new(Vec::new(), XZ_PRESET);
    encoder.write_all(body)?;
    encoder.finish()
}
