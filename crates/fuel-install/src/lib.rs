//! Download, patch and verification pipeline for fuel game installs
//!
//! This crate turns a signed remote manifest into verified files on disk.
//! It talks to the software distribution service (SDS) for manifests and
//! patch descriptors, plans the minimal transfer against the installed
//! manifest, and runs the plan on a bounded pool of tokio tasks.
//!
//! # Components
//!
//! - **Service**: [`SdsClient`] implementing [`ManifestSource`] and [`PatchLookup`]
//! - **Planning**: [`PatchPlanner`] batching hash pairs into lookup requests
//! - **Execution**: [`DownloadOrchestrator`] downloading, patching and verifying files
//! - **Flows**: [`DownloadManager`] install/update/verify/uninstall over an [`InstallStore`]
//!
//! # Example
//!
//! ```no_run
//! use fuel_install::{
//!     DownloadManager, DownloadOrchestrator, FileStore, HttpClient, InstallConfig, SdsClient,
//!     SdsConfig, StaticToken,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InstallConfig::default();
//! let sds = Arc::new(SdsClient::new(SdsConfig::default(), Arc::new(StaticToken::new("token")))?);
//! let orchestrator = DownloadOrchestrator::new(HttpClient::with_config(&config.http)?, config);
//! let manager = DownloadManager::new(
//!     sds.clone(),
//!     sds,
//!     Arc::new(FileStore::new("/var/lib/fuel")),
//!     orchestrator,
//! )?;
//!
//! let outcome = manager.install("game-id", Path::new("/games/demo")).await?;
//! println!("complete: {}", outcome.is_complete());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns

pub mod config;
pub mod error;
pub mod manager;
pub mod orchestrator;
pub mod paths;
pub mod planner;
pub mod progress;
pub mod retry;
pub mod sds;
pub mod service;
pub mod store;
pub mod transport;

pub use config::{HttpConfig, InstallConfig, SdsConfig};
pub use error::{FileError, FileResult, InstallError, InstallResult};
pub use manager::{DownloadManager, InstallOutcome};
pub use orchestrator::{DownloadOrchestrator, FileFailure, RunOutcome, RunReport};
pub use planner::PatchPlanner;
pub use progress::{ProgressSnapshot, ProgressState};
pub use retry::{RetryPolicy, Retryable};
pub use sds::SdsClient;
pub use service::{
    ManifestSource, PatchLookup, PatchRequest, RemoteManifest, StaticToken, TokenProvider,
};
pub use store::{FileStore, InstallStore, InstalledGame, MemoryStore};
pub use transport::HttpClient;
