//! Collaborators supplying manifests, patch descriptors and credentials
//!
//! [`crate::sds::SdsClient`] implements all service traits over HTTP;
//! embedders and tests can substitute their own.

use crate::error::InstallResult;
use async_trait::async_trait;
use fuel_formats::patch_manifest::{HashPair, PatchDescriptor};

/// Supplies the bearer token sent with every service request
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token
    async fn access_token(&self) -> InstallResult<String>;
}

/// A fixed token, for callers that manage refresh themselves
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> InstallResult<String> {
        Ok(self.0.clone())
    }
}

/// Latest published manifest of a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteManifest {
    /// Version id the manifest describes
    pub version: String,
    /// Raw, still unverified manifest blob
    pub bytes: Vec<u8>,
}

/// Source of remote manifests
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch the current manifest of `game_id`
    async fn fetch_manifest(&self, game_id: &str) -> InstallResult<RemoteManifest>;
}

/// One patch lookup request
#[derive(Debug, Clone, Copy)]
pub struct PatchRequest<'a> {
    /// Game id
    pub game_id: &'a str,
    /// Version id being installed
    pub version_id: &'a str,
    /// At most [`fuel_formats::patch_manifest::MAX_HASH_PAIRS_PER_REQUEST`] pairs
    pub hashes: &'a [HashPair],
}

/// Service answering which body to download for each target hash
#[async_trait]
pub trait PatchLookup: Send + Sync {
    /// Descriptors for the pairs of one request, in any order
    async fn get_patches(&self, request: &PatchRequest<'_>) -> InstallResult<Vec<PatchDescriptor>>;
}
