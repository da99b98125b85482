//! Concurrent execution of a download plan
//!
//! One task per planned file, at most `workers` of them active at a time.
//! The coordinator only multiplexes task completion, cancellation and the
//! progress tick; all file I/O happens inside the tasks.
//!
//! ```text
//! run(plan, target_dir)
//! ├── free space check          (no network yet)
//! ├── create planned dirs       (before any task starts)
//! └── spawn file tasks ──► select! { completion | cancel | tick }
//! ```

mod space;
mod worker;

pub use space::{available_space, ensure_space};

use crate::config::InstallConfig;
use crate::error::{FileError, InstallResult};
use crate::paths;
use crate::progress::{ProgressSnapshot, ProgressState};
use crate::transport::HttpClient;
use fuel_formats::patch_manifest::PatchManifest;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use worker::{FileJob, FileStatus, WorkerContext};

/// How a download pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every planned file is in place and verified
    Completed,
    /// Cancellation was requested; finished files stay in place
    Cancelled,
    /// At least one file failed
    Failed,
}

/// A file that could not be installed
#[derive(Debug)]
pub struct FileFailure {
    /// Manifest path of the file
    pub path: String,
    /// Why it failed
    pub error: FileError,
}

/// Result of one download pass
#[derive(Debug)]
pub struct RunReport {
    /// How the pass ended
    pub outcome: RunOutcome,
    /// Per-file failures in completion order
    pub failures: Vec<FileFailure>,
    /// Final counters
    pub progress: ProgressSnapshot,
}

impl RunReport {
    /// True when every planned file is in place
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// True when the pass stopped on a cancellation request
    pub fn is_cancelled(&self) -> bool {
        self.outcome == RunOutcome::Cancelled
    }
}

/// Runs download plans against a target directory
pub struct DownloadOrchestrator {
    http: HttpClient,
    config: InstallConfig,
    cancel: CancellationToken,
    progress: Mutex<Option<Arc<ProgressState>>>,
}

impl DownloadOrchestrator {
    /// Create an orchestrator with its own cancellation token
    pub fn new(http: HttpClient, config: InstallConfig) -> Self {
        Self {
            http,
            config,
            cancel: CancellationToken::new(),
            progress: Mutex::new(None),
        }
    }

    /// Use a caller-owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels running and future passes
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of the running pass
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Counters of the running or last pass
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.progress.lock().as_ref().map(|p| p.snapshot())
    }

    /// Configuration in use
    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Execute `plan` below `target_dir`
    ///
    /// Errors abort before any file is touched (space, paths, directory
    /// creation). Everything after that is reported per file in the
    /// returned [`RunReport`].
    pub async fn run(&self, plan: &PatchManifest, target_dir: &Path) -> InstallResult<RunReport> {
        let required = plan.total_download_size();
        tokio::fs::create_dir_all(target_dir).await?;

        let space_dir = target_dir.to_path_buf();
        let available = tokio::task::spawn_blocking(move || available_space(&space_dir))
            .await
            .unwrap_or(None);
        ensure_space(required, available)?;

        // Resolve everything up front so a bad path fails the pass cleanly
        let mut jobs = Vec::with_capacity(plan.files.len());
        for file in &plan.files {
            let target = paths::resolve(target_dir, &file.manifest_path())?;
            jobs.push(FileJob {
                file: file.clone(),
                target,
            });
        }
        for dir in &plan.dirs {
            tokio::fs::create_dir_all(paths::resolve(target_dir, dir)?).await?;
        }

        info!(
            files = jobs.len(),
            dirs = plan.dirs.len(),
            download = %crate::progress::readable_size(required),
            workers = self.config.workers,
            "Starting download pass"
        );

        let progress = Arc::new(ProgressState::new(required));
        *self.progress.lock() = Some(Arc::clone(&progress));

        let context = Arc::new(WorkerContext {
            http: self.http.clone(),
            cancel: self.cancel.clone(),
            progress: Arc::clone(&progress),
            block_size: self.config.patch_block_size,
            max_patch_attempts: self.config.max_patch_attempts,
            checksum_retries: self.config.checksum_retries,
            retry: self.config.retry.clone(),
        });
        let permits = Arc::new(Semaphore::new(self.config.workers.max(1)));

        let mut tasks = JoinSet::new();
        for job in jobs {
            let context = Arc::clone(&context);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let path = job.file.manifest_path();
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (path, Ok(FileStatus::Cancelled));
                };
                let result = worker::process(&context, &job).await;
                (path, result)
            });
        }

        let mut ticker = tokio::time::interval(self.config.progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut failures = Vec::new();
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    warn!(pending = tasks.len(), "Download pass cancelled");
                    tasks.abort_all();
                    cancelled = true;
                    break;
                }
                next = tasks.join_next() => match next {
                    None => break,
                    Some(Ok((_, Ok(FileStatus::Cancelled)))) => cancelled = true,
                    Some(Ok((path, Ok(status)))) => {
                        debug!(path, ?status, "File done");
                    }
                    Some(Ok((path, Err(error)))) => {
                        progress.file_failed();
                        warn!(path, %error, "File failed");
                        failures.push(FileFailure { path, error });
                    }
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => {
                        progress.file_failed();
                        warn!(error = %e, "File task panicked");
                        failures.push(FileFailure {
                            path: String::new(),
                            error: FileError::Task(e.to_string()),
                        });
                    }
                },
                _ = ticker.tick() => {
                    info!(progress = %progress.snapshot(), "Downloading");
                }
            }
        }

        let outcome = if cancelled {
            RunOutcome::Cancelled
        } else if failures.is_empty() {
            RunOutcome::Completed
        } else {
            RunOutcome::Failed
        };
        let snapshot = progress.snapshot();
        info!(
            ?outcome,
            completed = snapshot.completed_files,
            skipped = snapshot.skipped_files,
            failed = snapshot.failed_files,
            "Download pass finished"
        );

        Ok(RunReport {
            outcome,
            failures,
            progress: snapshot,
        })
    }
}

impl std::fmt::Debug for DownloadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
