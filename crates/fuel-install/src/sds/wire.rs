//! JSON payloads of the software distribution service

use crate::error::{InstallError, InstallResult};
use fuel_crypto::{ContentHash, HashAlgorithm};
use fuel_formats::patch_manifest::{HashPair, PatchDescriptor, PatchType};
use serde::{Deserialize, Serialize};

/// Hash as the service writes it: uppercase algorithm, hex value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireHash {
    pub algorithm: String,
    pub value: String,
}

impl From<&ContentHash> for WireHash {
    fn from(hash: &ContentHash) -> Self {
        Self {
            algorithm: hash.algorithm().wire_name().to_string(),
            value: hash.to_hex(),
        }
    }
}

impl TryFrom<&WireHash> for ContentHash {
    type Error = InstallError;

    fn try_from(wire: &WireHash) -> InstallResult<Self> {
        let algorithm: HashAlgorithm = wire
            .algorithm
            .parse()
            .map_err(|e| InstallError::invalid_response(format!("{e}")))?;
        Self::from_hex(algorithm, &wire.value)
            .map_err(|e| InstallError::invalid_response(format!("hash {}: {e}", wire.value)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHashPair {
    pub source_hash: Option<WireHash>,
    pub target_hash: WireHash,
}

impl From<&HashPair> for WireHashPair {
    fn from(pair: &HashPair) -> Self {
        Self {
            source_hash: pair.source_hash.as_ref().map(WireHash::from),
            target_hash: WireHash::from(&pair.target_hash),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadManifestRequest<'a> {
    #[serde(rename = "Operation")]
    pub operation: &'static str,
    pub adg_good_id: &'a str,
    pub previous_version_id: Option<&'a str>,
    pub key_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadManifestResponse {
    #[serde(default)]
    pub download_urls: Vec<String>,
    pub version_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPatchesRequest<'a> {
    #[serde(rename = "Operation")]
    pub operation: &'static str,
    pub version_id: &'a str,
    pub file_hashes: Vec<WireHashPair>,
    pub delta_encodings: [&'static str; 2],
    pub adg_good_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GetPatchesResponse {
    #[serde(default)]
    pub patches: Vec<WirePatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePatch {
    #[serde(default)]
    pub download_urls: Vec<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub patch_hash: Option<WireHash>,
    pub target_hash: WireHash,
    #[serde(rename = "type", default)]
    pub patch_type: Option<String>,
}

impl TryFrom<&WirePatch> for PatchDescriptor {
    type Error = InstallError;

    fn try_from(patch: &WirePatch) -> InstallResult<Self> {
        // untyped bodies are complete files
        let patch_type = patch
            .patch_type
            .as_deref()
            .map_or(PatchType::None, PatchType::from_wire_name);
        Ok(Self {
            urls: patch.download_urls.clone(),
            size: patch.size,
            patch_hash: patch
                .patch_hash
                .as_ref()
                .map(ContentHash::try_from)
                .transpose()?,
            target_hash: ContentHash::try_from(&patch.target_hash)?,
            patch_type,
        })
    }
}
