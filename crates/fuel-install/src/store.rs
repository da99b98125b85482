//! Durable install state
//!
//! Only two things survive a pass: the raw manifest blob each game was
//! installed from, and the list of install records. Both are replaced
//! wholesale on write.

use crate::error::{InstallError, InstallResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Install record of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledGame {
    /// Game id
    pub id: String,
    /// Version id the files match
    pub version: String,
    /// Install directory
    pub path: PathBuf,
}

/// Persistence of manifests and install records
#[async_trait]
pub trait InstallStore: Send + Sync {
    /// Raw manifest blob a game was installed from
    async fn load_manifest(&self, game_id: &str) -> InstallResult<Option<Vec<u8>>>;

    /// Replace the stored manifest blob of a game
    async fn save_manifest(&self, game_id: &str, raw: &[u8]) -> InstallResult<()>;

    /// Forget the stored manifest of a game; missing is not an error
    async fn remove_manifest(&self, game_id: &str) -> InstallResult<()>;

    /// All install records
    async fn installed(&self) -> InstallResult<Vec<InstalledGame>>;

    /// Replace the install record list
    async fn save_installed(&self, games: &[InstalledGame]) -> InstallResult<()>;

    /// Install record of one game
    async fn installed_game(&self, game_id: &str) -> InstallResult<Option<InstalledGame>> {
        Ok(self.installed().await?.into_iter().find(|g| g.id == game_id))
    }
}

/// Insert `game` or replace the record with the same id
///
/// Returns true when an existing record was replaced.
pub fn upsert(games: &mut Vec<InstalledGame>, game: InstalledGame) -> bool {
    if let Some(existing) = games.iter_mut().find(|g| g.id == game.id) {
        *existing = game;
        true
    } else {
        games.push(game);
        false
    }
}

/// Store backed by a directory
///
/// ```text
/// <root>/
/// ├── installed.json
/// └── manifests/
///     └── <game id>.raw
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root`; directories are created on first write
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self, game_id: &str) -> InstallResult<PathBuf> {
        if game_id.is_empty()
            || game_id.starts_with('.')
            || game_id.contains(['/', '\\'])
        {
            return Err(InstallError::store(format!("invalid game id: {game_id:?}")));
        }
        Ok(self.root.join("manifests").join(format!("{game_id}.raw")))
    }

    fn installed_path(&self) -> PathBuf {
        self.root.join("installed.json")
    }
}

/// Write through a temporary sibling so readers never see half a file
async fn write_replace(path: &Path, data: &[u8]) -> InstallResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = crate::paths::with_suffix(path, ".tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_optional(path: &Path) -> InstallResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl InstallStore for FileStore {
    async fn load_manifest(&self, game_id: &str) -> InstallResult<Option<Vec<u8>>> {
        read_optional(&self.manifest_path(game_id)?).await
    }

    async fn save_manifest(&self, game_id: &str, raw: &[u8]) -> InstallResult<()> {
        let path = self.manifest_path(game_id)?;
        debug!(game_id, bytes = raw.len(), path = %path.display(), "Saving manifest");
        write_replace(&path, raw).await
    }

    async fn remove_manifest(&self, game_id: &str) -> InstallResult<()> {
        match tokio::fs::remove_file(self.manifest_path(game_id)?).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn installed(&self) -> InstallResult<Vec<InstalledGame>> {
        match read_optional(&self.installed_path()).await? {
            Some(data) => serde_json::from_slice(&data).map_err(|e| {
                InstallError::store(format!("corrupt {}: {e}", self.installed_path().display()))
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn save_installed(&self, games: &[InstalledGame]) -> InstallResult<()> {
        let data = serde_json::to_vec_pretty(games)?;
        write_replace(&self.installed_path(), &data).await
    }
}

/// Store kept in memory, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    manifests: RwLock<HashMap<String, Vec<u8>>>,
    installed: RwLock<Vec<InstalledGame>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstallStore for MemoryStore {
    async fn load_manifest(&self, game_id: &str) -> InstallResult<Option<Vec<u8>>> {
        Ok(self.manifests.read().get(game_id).cloned())
    }

    async fn save_manifest(&self, game_id: &str, raw: &[u8]) -> InstallResult<()> {
        self.manifests
            .write()
            .insert(game_id.to_string(), raw.to_vec());
        Ok(())
    }

    async fn remove_manifest(&self, game_id: &str) -> InstallResult<()> {
        self.manifests.write().remove(game_id);
        Ok(())
    }

    async fn installed(&self) -> InstallResult<Vec<InstalledGame>> {
        Ok(self.installed.read().clone())
    }

    async fn save_installed(&self, games: &[InstalledGame]) -> InstallResult<()> {
        *self.installed.write() = games.to_vec();
        Ok(())
    }
}
