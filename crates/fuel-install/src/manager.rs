//! Install, update, verify and uninstall flows
//!
//! The manager wires the collaborators together: it fetches and decodes
//! manifests, compares them, plans a pass, runs it and records the result.
//! Every pass that is not cancelled changes the install store, even when
//! some files failed; `verify` never does.

use crate::error::{InstallError, InstallResult};
use crate::orchestrator::{DownloadOrchestrator, RunReport};
use crate::paths;
use crate::planner::PatchPlanner;
use crate::service::{ManifestSource, PatchLookup};
use crate::store::{InstallStore, InstalledGame, upsert};
use fuel_formats::manifest::{Comparison, FileEntry, Manifest, ManifestCodec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of an install, update or verify operation
#[derive(Debug)]
pub enum InstallOutcome {
    /// Nothing had to be downloaded
    UpToDate,
    /// A download pass ran
    Pass(RunReport),
}

impl InstallOutcome {
    /// True when the installation now matches the manifest
    pub fn is_complete(&self) -> bool {
        match self {
            Self::UpToDate => true,
            Self::Pass(report) => report.is_complete(),
        }
    }
}

/// Drives whole install operations for one install store
pub struct DownloadManager {
    manifests: Arc<dyn ManifestSource>,
    patches: Arc<dyn PatchLookup>,
    store: Arc<dyn InstallStore>,
    orchestrator: DownloadOrchestrator,
    codec: ManifestCodec,
}

impl DownloadManager {
    /// Create a manager verifying manifests with the embedded key
    pub fn new(
        manifests: Arc<dyn ManifestSource>,
        patches: Arc<dyn PatchLookup>,
        store: Arc<dyn InstallStore>,
        orchestrator: DownloadOrchestrator,
    ) -> InstallResult<Self> {
        Ok(Self::with_codec(
            manifests,
            patches,
            store,
            orchestrator,
            ManifestCodec::new()?,
        ))
    }

    /// Create a manager with a custom manifest codec
    pub fn with_codec(
        manifests: Arc<dyn ManifestSource>,
        patches: Arc<dyn PatchLookup>,
        store: Arc<dyn InstallStore>,
        orchestrator: DownloadOrchestrator,
        codec: ManifestCodec,
    ) -> Self {
        Self {
            manifests,
            patches,
            store,
            orchestrator,
            codec,
        }
    }

    /// The orchestrator running the passes, for progress and cancellation
    pub fn orchestrator(&self) -> &DownloadOrchestrator {
        &self.orchestrator
    }

    /// Install `game_id` into `install_path`
    ///
    /// An already installed game is updated in place at its recorded path.
    pub async fn install(
        &self,
        game_id: &str,
        install_path: &Path,
    ) -> InstallResult<InstallOutcome> {
        let path = match self.store.installed_game(game_id).await? {
            Some(record) => {
                if record.path != install_path {
                    info!(
                        game_id,
                        path = %record.path.display(),
                        "Game already installed, updating at recorded path"
                    );
                }
                record.path
            }
            None => install_path.to_path_buf(),
        };
        self.sync(game_id, path).await
    }

    /// Bring an installed game to the latest published version
    pub async fn update(&self, game_id: &str) -> InstallResult<InstallOutcome> {
        let record = self.record(game_id).await?;
        self.sync(game_id, record.path).await
    }

    /// Re-check every file of the installed version and repair mismatches
    ///
    /// Nothing is persisted, whatever the outcome.
    pub async fn verify(&self, game_id: &str) -> InstallResult<InstallOutcome> {
        let record = self.record(game_id).await?;
        let manifest = self
            .installed_manifest(game_id)
            .await?
            .ok_or_else(|| InstallError::MissingManifest(game_id.to_string()))?;

        let comparison = Comparison::compare(&manifest, None);
        if comparison.is_empty() {
            return Ok(InstallOutcome::UpToDate);
        }

        info!(game_id, files = comparison.new.len(), "Verifying installation");
        let plan = PatchPlanner::new(Arc::clone(&self.patches), game_id, record.version.as_str())
            .plan(&comparison)
            .await?;
        let report = self.orchestrator.run(&plan, &record.path).await?;
        Ok(InstallOutcome::Pass(report))
    }

    /// Delete the files of an installed game and forget it
    ///
    /// Returns the number of files removed. Files already gone are skipped.
    pub async fn uninstall(&self, game_id: &str) -> InstallResult<usize> {
        let record = self.record(game_id).await?;

        let removed = match self.installed_manifest(game_id).await? {
            Some(manifest) => remove_files(&record.path, manifest.files()).await?,
            None => {
                warn!(game_id, "No stored manifest, leaving files in place");
                0
            }
        };

        let mut games = self.store.installed().await?;
        games.retain(|g| g.id != game_id);
        self.store.save_installed(&games).await?;
        self.store.remove_manifest(game_id).await?;

        info!(game_id, removed, "Game uninstalled");
        Ok(removed)
    }

    async fn record(&self, game_id: &str) -> InstallResult<InstalledGame> {
        self.store
            .installed_game(game_id)
            .await?
            .ok_or_else(|| InstallError::NotInstalled(game_id.to_string()))
    }

    async fn installed_manifest(&self, game_id: &str) -> InstallResult<Option<Manifest>> {
        match self.store.load_manifest(game_id).await? {
            Some(raw) => Ok(Some(self.codec.decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Install or update to the remote manifest
    async fn sync(&self, game_id: &str, path: PathBuf) -> InstallResult<InstallOutcome> {
        let remote = self.manifests.fetch_manifest(game_id).await?;
        let manifest = self.codec.decode(&remote.bytes)?;
        debug!(
            game_id,
            version = %remote.version,
            packages = manifest.packages().len(),
            "Remote manifest verified"
        );

        let installed = match self.installed_manifest(game_id).await {
            Ok(installed) => installed,
            Err(e) => {
                warn!(game_id, error = %e, "Stored manifest unusable, checking every file");
                None
            }
        };

        let comparison = Comparison::compare(&manifest, installed.as_ref());
        if comparison.is_empty() {
            info!(game_id, version = %remote.version, "Game is up to date");
            self.persist(game_id, &remote.version, &path, &manifest).await?;
            return Ok(InstallOutcome::UpToDate);
        }

        let plan = PatchPlanner::new(Arc::clone(&self.patches), game_id, remote.version.as_str())
            .plan(&comparison)
            .await?;
        let report = self.orchestrator.run(&plan, &path).await?;

        if report.is_cancelled() {
            warn!(game_id, "Install cancelled, keeping previous record");
            return Ok(InstallOutcome::Pass(report));
        }

        let removed = remove_files(&path, &comparison.removed).await?;
        debug!(game_id, removed, "Removed files dropped from the manifest");
        self.persist(game_id, &remote.version, &path, &manifest).await?;
        if report.is_complete() {
            info!(game_id, version = %remote.version, "Install complete");
        } else {
            warn!(
                game_id,
                version = %remote.version,
                failures = report.failures.len(),
                "Install finished with failed files, run verify to repair"
            );
        }
        Ok(InstallOutcome::Pass(report))
    }

    async fn persist(
        &self,
        game_id: &str,
        version: &str,
        path: &Path,
        manifest: &Manifest,
    ) -> InstallResult<()> {
        self.store.save_manifest(game_id, manifest.raw_bytes()).await?;

        let mut games = self.store.installed().await?;
        upsert(
            &mut games,
            InstalledGame {
                id: game_id.to_string(),
                version: version.to_string(),
                path: path.to_path_buf(),
            },
        );
        self.store.save_installed(&games).await
    }
}

impl std::fmt::Debug for DownloadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadManager")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

/// Delete the given manifest files below `root`, tolerating missing ones
async fn remove_files(root: &Path, files: &[FileEntry]) -> InstallResult<usize> {
    let mut removed = 0;
    for file in files {
        let path = paths::resolve(root, &file.path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(removed)
}
