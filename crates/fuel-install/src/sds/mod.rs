//! Software distribution service client
//!
//! Every operation is a JSON `POST` to `{sds_url}/amazon/` with the
//! operation named twice: in the `X-Amz-Target` header (fully qualified)
//! and in the body's `Operation` field.
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | `GetDownloadManifestV3` | version id and download URLs of the current manifest |
//! | `GetPatches` | download descriptor for each target hash of a batch |

mod wire;

use crate::config::SdsConfig;
use crate::error::{InstallError, InstallResult};
use crate::service::{ManifestSource, PatchLookup, PatchRequest, RemoteManifest, TokenProvider};
use crate::transport::HttpClient;
use async_trait::async_trait;
use fuel_formats::patch_manifest::{PatchDescriptor, PatchType};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use wire::{
    DownloadManifestRequest, DownloadManifestResponse, GetPatchesRequest, GetPatchesResponse,
    WireHashPair,
};

/// Namespace prefixed to operation names in `X-Amz-Target`
pub const TARGET_PREFIX: &str =
    "com.amazonaws.gearbox.softwaredistribution.service.model.SoftwareDistributionService.";

/// Body encodings offered to `GetPatches`, preferred first
pub const DELTA_ENCODINGS: [&str; 2] = ["FUEL_PATCH", "NONE"];

const GET_DOWNLOAD_MANIFEST: &str = "GetDownloadManifestV3";
const GET_PATCHES: &str = "GetPatches";

/// HTTP client of the distribution service
#[derive(Clone)]
pub struct SdsClient {
    http: HttpClient,
    config: SdsConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for SdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdsClient")
            .field("sds_url", &self.config.sds_url)
            .finish_non_exhaustive()
    }
}

impl SdsClient {
    /// Create a client with its own connection pool
    pub fn new(config: SdsConfig, tokens: Arc<dyn TokenProvider>) -> InstallResult<Self> {
        let http = HttpClient::with_config(&config.http)?;
        Ok(Self::with_http_client(http, config, tokens))
    }

    /// Create a client sharing an existing connection pool
    pub fn with_http_client(
        http: HttpClient,
        config: SdsConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &SdsConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/amazon/", self.config.sds_url.trim_end_matches('/'))
    }

    /// Invoke one service operation, retrying transient failures
    async fn call<B, R>(&self, operation: &str, body: &B) -> InstallResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;
        let payload = serde_json::to_vec(body)?;
        debug!(operation, bytes = payload.len(), "Calling distribution service");

        let bytes = self
            .config
            .retry
            .execute(operation, || self.post(operation, &token, &payload))
            .await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| InstallError::invalid_response(format!("{operation}: {e}")))
    }

    async fn post(&self, operation: &str, token: &str, payload: &[u8]) -> InstallResult<Vec<u8>> {
        let response = self
            .http
            .inner()
            .post(self.endpoint())
            .header("X-Amz-Target", format!("{TARGET_PREFIX}{operation}"))
            .header("x-amzn-token", token)
            .header(USER_AGENT, self.config.user_agent.as_str())
            .header("UserAgent", self.config.user_agent.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "amz-1.0")
            .body(payload.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(operation, %status, "Distribution service request failed");
            return Err(InstallError::HttpStatus {
                operation: operation.to_string(),
                status,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn get(&self, url: &str) -> InstallResult<Vec<u8>> {
        let response = self.http.inner().get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::HttpStatus {
                operation: "manifest download".to_string(),
                status,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Version id and download URLs of the current manifest of `game_id`
    pub async fn download_manifest_info(
        &self,
        game_id: &str,
    ) -> InstallResult<(String, Vec<String>)> {
        let request = DownloadManifestRequest {
            operation: GET_DOWNLOAD_MANIFEST,
            adg_good_id: game_id,
            previous_version_id: None,
            key_id: &self.config.key_id,
        };
        let response: DownloadManifestResponse =
            self.call(GET_DOWNLOAD_MANIFEST, &request).await?;
        Ok((response.version_id, response.download_urls))
    }
}

#[async_trait]
impl ManifestSource for SdsClient {
    async fn fetch_manifest(&self, game_id: &str) -> InstallResult<RemoteManifest> {
        let (version, urls) = self.download_manifest_info(game_id).await?;
        let url = urls.first().ok_or_else(|| {
            InstallError::invalid_response(format!("no manifest download URL for {game_id}"))
        })?;

        debug!(game_id, %version, url, "Downloading manifest");
        let bytes = self
            .config
            .retry
            .execute("manifest download", || self.get(url))
            .await?;
        debug!(game_id, bytes = bytes.len(), "Manifest downloaded");

        Ok(RemoteManifest { version, bytes })
    }
}

#[async_trait]
impl PatchLookup for SdsClient {
    async fn get_patches(&self, request: &PatchRequest<'_>) -> InstallResult<Vec<PatchDescriptor>> {
        let body = GetPatchesRequest {
            operation: GET_PATCHES,
            version_id: request.version_id,
            file_hashes: request.hashes.iter().map(WireHashPair::from).collect(),
            delta_encodings: DELTA_ENCODINGS,
            adg_good_id: request.game_id,
        };
        let response: GetPatchesResponse = self.call(GET_PATCHES, &body).await?;

        let descriptors = response
            .patches
            .iter()
            .map(PatchDescriptor::try_from)
            .collect::<InstallResult<Vec<_>>>()?;
        debug!(
            requested = request.hashes.len(),
            returned = descriptors.len(),
            deltas = descriptors
                .iter()
                .filter(|d| d.patch_type == PatchType::FuelPatch)
                .count(),
            "Received patch descriptors"
        );
        Ok(descriptors)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::service::StaticToken;
    use fuel_crypto::{ContentHash, HashAlgorithm};
    use fuel_formats::patch_manifest::HashPair;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SdsClient {
        SdsClient::new(
            SdsConfig::with_url(server.uri()),
            Arc::new(StaticToken::new("token-1")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_manifest_follows_download_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(header(
                "X-Amz-Target",
                format!("{TARGET_PREFIX}GetDownloadManifestV3").as_str(),
            ))
            .and(header("x-amzn-token", "token-1"))
            .and(header("Content-Encoding", "amz-1.0"))
            .and(body_partial_json(serde_json::json!({
                "Operation": "GetDownloadManifestV3",
                "adgGoodId": "game-1",
                "previousVersionId": null,
                "keyId": "d5dc8b8b-86c8-4fc4-ae93-18c0def5314d"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "versionId": "v2",
                "downloadUrls": [format!("{}/manifests/game-1", server.uri())]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/manifests/game-1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"blob".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let manifest = client(&server).fetch_manifest("game-1").await.unwrap();
        assert_eq!(manifest.version, "v2");
        assert_eq!(manifest.bytes, b"blob");
    }

    #[tokio::test]
    async fn test_get_patches_request_shape() {
        let server = MockServer::start().await;
        let target = ContentHash::compute(HashAlgorithm::Sha256, b"new");

        Mock::given(method("POST"))
            .and(path("/amazon/"))
            .and(header("X-Amz-Target", format!("{TARGET_PREFIX}GetPatches").as_str()))
            .and(body_partial_json(serde_json::json!({
                "Operation": "GetPatches",
                "versionId": "v2",
                "adgGoodId": "game-1",
                "deltaEncodings": ["FUEL_PATCH", "NONE"],
                "fileHashes": [{
                    "sourceHash": null,
                    "targetHash": {"algorithm": "SHA256", "value": target.to_hex()}
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "patches": [{
                    "downloadUrls": ["https://cdn.example/full"],
                    "size": 3,
                    "targetHash": {"algorithm": "SHA256", "value": target.to_hex()},
                    "type": "NONE"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let hashes = [HashPair {
            source_hash: None,
            target_hash: target.clone(),
        }];
        let descriptors = client(&server)
            .get_patches(&PatchRequest {
                game_id: "game-1",
                version_id: "v2",
                hashes: &hashes,
            })
            .await
            .unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].target_hash, target);
        assert_eq!(descriptors[0].patch_type, PatchType::None);
        assert_eq!(descriptors[0].patch_hash, None);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).fetch_manifest("game-1").await.unwrap_err();
        assert!(matches!(
            err,
            InstallError::HttpStatus { status, .. } if status == reqwest::StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn test_unavailable_service_is_retried() {
        let server = MockServer::start().await;
        let target = ContentHash::compute(HashAlgorithm::Sha256, b"new");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "patches": [{
                    "downloadUrls": ["https://cdn.example/full"],
                    "size": 3,
                    "targetHash": {"algorithm": "SHA256", "value": target.to_hex()},
                    "type": "NONE"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let hashes = [HashPair {
            source_hash: None,
            target_hash: target,
        }];
        let descriptors = client(&server)
            .get_patches(&PatchRequest {
                game_id: "game-1",
                version_id: "v2",
                hashes: &hashes,
            })
            .await
            .unwrap();
        assert_eq!(descriptors.len(), 1);
    }

    #[tokio::test]
    async fn test_retries_stop_after_policy_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let mut config = SdsConfig::with_url(server.uri());
        config.retry.max_retries = 1;
        let client = SdsClient::new(config, Arc::new(StaticToken::new("token-1"))).unwrap();
        let err = client.fetch_manifest("game-1").await.unwrap_err();
        assert!(err.should_retry());
    }

    #[tokio::test]
    async fn test_missing_download_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"versionId": "v1", "downloadUrls": []})),
            )
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).fetch_manifest("game-1").await,
            Err(InstallError::InvalidResponse(_))
        ));
    }
}
