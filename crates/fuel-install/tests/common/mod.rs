//! Shared fixtures for install integration tests

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use async_trait::async_trait;
use fuel_crypto::{ContentHash, HashAlgorithm, SignatureVerifier};
use fuel_formats::manifest::{FileEntry, ManifestCodec, ManifestEncoder, Package};
use fuel_formats::patch_manifest::{PatchDescriptor, PatchType};
use fuel_install::{
    DownloadManager, DownloadOrchestrator, HttpClient, InstallConfig, InstallResult, InstallStore,
    InstalledGame, ManifestSource, MemoryStore, PatchLookup, PatchRequest, RemoteManifest,
};
use parking_lot::Mutex;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const PRIVATE_KEY: &str =
    include_str!("../../../fuel-formats/test_fixtures/manifest_signing_key.pem");
const PUBLIC_KEY: &str =
    include_str!("../../../fuel-formats/test_fixtures/manifest_signing_key.pub.pem");

pub const GAME_ID: &str = "amzn1.adg.product.demo";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn codec() -> ManifestCodec {
    ManifestCodec::with_verifier(SignatureVerifier::from_public_key_pem(PUBLIC_KEY).unwrap())
}

pub fn sha256(data: &[u8]) -> ContentHash {
    ContentHash::compute(HashAlgorithm::Sha256, data)
}

pub fn entry(path: &str, content: &[u8]) -> FileEntry {
    FileEntry::new(path, content.len() as i64, sha256(content))
}

/// Signed manifest blob listing `files` in its first package
pub fn manifest_blob(files: Vec<FileEntry>) -> Vec<u8> {
    ManifestEncoder::new(RsaPrivateKey::from_pkcs1_pem(PRIVATE_KEY).unwrap())
        .encode(&[Package {
            name: "main".to_string(),
            files,
            dirs: Vec::new(),
        }])
        .unwrap()
}

pub fn full_file(url: String, content: &[u8]) -> PatchDescriptor {
    PatchDescriptor {
        urls: vec![url],
        size: content.len() as u64,
        patch_hash: None,
        target_hash: sha256(content),
        patch_type: PatchType::None,
    }
}

pub fn config() -> InstallConfig {
    let mut config = InstallConfig::default().with_workers(4);
    config.progress_interval = std::time::Duration::from_millis(50);
    config
}

pub fn orchestrator(config: InstallConfig) -> DownloadOrchestrator {
    DownloadOrchestrator::new(HttpClient::with_config(&config.http).unwrap(), config)
}

/// In-process distribution service
pub struct FakeService {
    pub version: String,
    pub manifest: Vec<u8>,
    pub descriptors: Vec<PatchDescriptor>,
    pub lookups: AtomicUsize,
    pub requested: Mutex<Vec<ContentHash>>,
}

impl FakeService {
    pub fn new(version: &str, manifest: Vec<u8>, descriptors: Vec<PatchDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            version: version.to_string(),
            manifest,
            descriptors,
            lookups: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestSource for FakeService {
    async fn fetch_manifest(&self, _game_id: &str) -> InstallResult<RemoteManifest> {
        Ok(RemoteManifest {
            version: self.version.clone(),
            bytes: self.manifest.clone(),
        })
    }
}

#[async_trait]
impl PatchLookup for FakeService {
    async fn get_patches(&self, request: &PatchRequest<'_>) -> InstallResult<Vec<PatchDescriptor>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let mut requested = self.requested.lock();
        Ok(request
            .hashes
            .iter()
            .filter_map(|pair| {
                requested.push(pair.target_hash.clone());
                self.descriptors
                    .iter()
                    .find(|d| d.target_hash == pair.target_hash)
                    .cloned()
            })
            .collect())
    }
}

/// Memory store counting writes
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstallStore for CountingStore {
    async fn load_manifest(&self, game_id: &str) -> InstallResult<Option<Vec<u8>>> {
        self.inner.load_manifest(game_id).await
    }

    async fn save_manifest(&self, game_id: &str, raw: &[u8]) -> InstallResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_manifest(game_id, raw).await
    }

    async fn remove_manifest(&self, game_id: &str) -> InstallResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_manifest(game_id).await
    }

    async fn installed(&self) -> InstallResult<Vec<InstalledGame>> {
        self.inner.installed().await
    }

    async fn save_installed(&self, games: &[InstalledGame]) -> InstallResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_installed(games).await
    }
}

/// Store already holding an install of `manifest` at `path`
pub async fn installed_store(manifest: &[u8], version: &str, path: &Path) -> Arc<CountingStore> {
    let store = CountingStore::default();
    store.inner.save_manifest(GAME_ID, manifest).await.unwrap();
    store
        .inner
        .save_installed(&[InstalledGame {
            id: GAME_ID.to_string(),
            version: version.to_string(),
            path: path.to_path_buf(),
        }])
        .await
        .unwrap();
    Arc::new(store)
}

pub fn manager(
    service: &Arc<FakeService>,
    store: Arc<CountingStore>,
    config: InstallConfig,
) -> DownloadManager {
    DownloadManager::with_codec(
        service.clone(),
        service.clone(),
        store,
        orchestrator(config),
        codec(),
    )
}

/// Write `content` at manifest path `path` below `root`
pub fn place(root: &Path, path: &str, content: &[u8]) -> PathBuf {
    let full = fuel_install::paths::resolve(root, path).unwrap();
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, content).unwrap();
    full
}
