//! Download manifest decoding
//!
//! Decoding is all-or-nothing: the body is decompressed and its signature
//! checked before a single field of it is deserialized.

use crate::manifest::{
    Manifest,
    error::{ManifestError, ManifestResult},
    model::{CompressionAlgorithm, ManifestHeader, Package},
    proto,
};
use fuel_crypto::SignatureVerifier;
use prost::Message;
use std::borrow::Cow;
use std::io::Read;
use tracing::debug;
use xz2::read::XzDecoder;
use xz2::stream::Stream;

/// Size of the big-endian header length prefix
pub const HEADER_LENGTH_SIZE: usize = 4;

/// Decoder for signed, compressed download manifests
///
/// # Examples
///
/// ```rust,no_run
/// use fuel_formats::manifest::ManifestCodec;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let raw = std::fs::read("manifest.raw")?;
/// let manifest = ManifestCodec::new()?.decode(&raw)?;
/// println!("{} files", manifest.files().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ManifestCodec {
    verifier: SignatureVerifier,
}

impl ManifestCodec {
    /// Codec verifying against the embedded distribution service key
    pub fn new() -> ManifestResult<Self> {
        Ok(Self::with_verifier(SignatureVerifier::embedded()?))
    }

    /// Codec verifying against a caller-supplied key
    pub fn with_verifier(verifier: SignatureVerifier) -> Self {
        Self { verifier }
    }

    /// Decode and verify a raw manifest blob
    pub fn decode(&self, data: &[u8]) -> ManifestResult<Manifest> {
        let (header, body) = split_header(data)?;

        let body = decompress(header.compression, body)?;
        self.verifier
            .verify(header.signature.algorithm, &body, &header.signature.value)?;

        let packages = proto::Manifest::decode(body.as_ref())
            .map_err(ManifestError::Decode)?
            .packages
            .into_iter()
            .map(Package::try_from)
            .collect::<ManifestResult<Vec<_>>>()?;

        debug!(
            compression = ?header.compression,
            packages = packages.len(),
            body_size = body.len(),
            "Decoded download manifest"
        );

        Ok(Manifest::from_parts(header, packages, data.to_vec()))
    }
}

/// Split a blob into its decoded header and the (still compressed) body
pub fn split_header(data: &[u8]) -> ManifestResult<(ManifestHeader, &[u8])> {
    let Some(prefix) = data.first_chunk::<HEADER_LENGTH_SIZE>() else {
        return Err(ManifestError::Truncated {
            needed: HEADER_LENGTH_SIZE,
            available: data.len(),
        });
    };
    let header_len = u32::from_be_bytes(*prefix) as usize;
    let body_start = HEADER_LENGTH_SIZE.saturating_add(header_len);
    if data.len() < body_start {
        return Err(ManifestError::Truncated {
            needed: body_start,
            available: data.len(),
        });
    }

    let header = proto::ManifestHeader::decode(&data[HEADER_LENGTH_SIZE..body_start])
        .map_err(ManifestError::InvalidHeader)?;
    Ok((ManifestHeader::try_from(header)?, &data[body_start..]))
}

fn decompress(compression: CompressionAlgorithm, body: &[u8]) -> ManifestResult<Cow<'_, [u8]>> {
    match compression {
        CompressionAlgorithm::None => Ok(Cow::Borrowed(body)),
        CompressionAlgorithm::Lzma => {
            // accepts both .xz and legacy .lzma containers
            let stream = Stream::new_auto_decoder(u64::MAX, 0)
                .map_err(|e| ManifestError::Decompression(e.into()))?;
            let mut decoder = XzDecoder::new_stream(body, stream);
            let mut out = Vec::with_capacity(body.len() * 4);
            decoder
                .read_to_end(&mut out)
                .map_err(ManifestError::Decompression)?;
            Ok(Cow::Owned(out))
        }
    }
}
