//! Per-file download, patch and verification

use crate::error::{FileError, FileResult};
use crate::paths::with_suffix;
use crate::progress::ProgressState;
use crate::retry::RetryPolicy;
use crate::transport::HttpClient;
use fuel_crypto::ContentHash;
use fuel_formats::fuel_patch::FuelPatcher;
use fuel_formats::patch_manifest::PatchFile;
use futures::StreamExt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shared state of all file tasks of one pass
pub(super) struct WorkerContext {
    pub http: HttpClient,
    pub cancel: CancellationToken,
    pub progress: Arc<ProgressState>,
    pub block_size: usize,
    pub max_patch_attempts: Option<u32>,
    pub checksum_retries: u32,
    pub retry: RetryPolicy,
}

/// One planned file with its resolved location
pub(super) struct FileJob {
    pub file: PatchFile,
    pub target: PathBuf,
}

/// How a file task ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FileStatus {
    /// Target already had the expected content
    Skipped,
    /// Full body downloaded and verified
    Downloaded,
    /// Delta applied and result verified
    Patched,
    /// Stopped because the pass was cancelled
    Cancelled,
}

enum Fetch {
    Complete,
    Cancelled,
}

pub(super) async fn process(ctx: &WorkerContext, job: &FileJob) -> FileResult<FileStatus> {
    if ctx.cancel.is_cancelled() {
        return Ok(FileStatus::Cancelled);
    }

    let file = &job.file;
    if tokio::fs::try_exists(&job.target).await?
        && hash_file(&job.target, &file.target_hash).await? == file.target_hash
    {
        debug!(path = %job.target.display(), "Already up to date");
        ctx.progress.file_skipped(file.download_size);
        return Ok(FileStatus::Skipped);
    }

    let status = match &file.patch_hash {
        Some(patch_hash) => process_delta(ctx, job, patch_hash).await?,
        None => process_full(ctx, job).await?,
    };
    if status != FileStatus::Cancelled {
        ctx.progress.file_completed();
    }
    Ok(status)
}

/// Download a complete file; retried as a whole on checksum mismatch
async fn process_full(ctx: &WorkerContext, job: &FileJob) -> FileResult<FileStatus> {
    let body = with_suffix(&job.target, ".patch");
    let expected = &job.file.target_hash;

    let mut retries = 0;
    loop {
        if let Fetch::Cancelled = fetch(ctx, &job.file, &body).await? {
            return Ok(FileStatus::Cancelled);
        }

        let actual = hash_file(&body, expected).await?;
        if actual == *expected {
            tokio::fs::rename(&body, &job.target).await?;
            return Ok(FileStatus::Downloaded);
        }

        warn!(
            path = %job.target.display(),
            expected = %expected,
            actual = %actual,
            retries,
            "Downloaded file failed checksum"
        );
        if retries >= ctx.checksum_retries {
            remove_if_exists(&body).await?;
            return Err(FileError::ChecksumMismatch {
                what: "file",
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }
        retries += 1;
    }
}

/// Download a delta body until it verifies, then rebuild the target
async fn process_delta(
    ctx: &WorkerContext,
    job: &FileJob,
    patch_hash: &ContentHash,
) -> FileResult<FileStatus> {
    let body = with_suffix(&job.target, ".patch");

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        if let Fetch::Cancelled = fetch(ctx, &job.file, &body).await? {
            return Ok(FileStatus::Cancelled);
        }

        let actual = hash_file(&body, patch_hash).await?;
        if actual == *patch_hash {
            break;
        }

        warn!(
            path = %job.target.display(),
            expected = %patch_hash,
            actual = %actual,
            attempts,
            "Delta body failed checksum, downloading again"
        );
        if ctx.max_patch_attempts.is_some_and(|max| attempts >= max) {
            remove_if_exists(&body).await?;
            return Err(FileError::ChecksumMismatch {
                what: "patch",
                expected: patch_hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
    }

    if ctx.cancel.is_cancelled() {
        return Ok(FileStatus::Cancelled);
    }

    let rebuilt = with_suffix(&job.target, ".new");
    let written = apply_patch(&job.target, &body, &rebuilt, ctx.block_size).await?;

    if ctx.cancel.is_cancelled() {
        remove_if_exists(&rebuilt).await?;
        return Ok(FileStatus::Cancelled);
    }

    let expected = &job.file.target_hash;
    let actual = hash_file(&rebuilt, expected).await?;
    if actual != *expected {
        remove_if_exists(&rebuilt).await?;
        return Err(FileError::ChecksumMismatch {
            what: "file",
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        });
    }

    tokio::fs::rename(&rebuilt, &job.target).await?;
    remove_if_exists(&body).await?;
    debug!(path = %job.target.display(), bytes = written, "Delta applied");
    Ok(FileStatus::Patched)
}

/// Download with retries on transient HTTP failures
async fn fetch(ctx: &WorkerContext, file: &PatchFile, dest: &Path) -> FileResult<Fetch> {
    ctx.retry
        .execute("download", || download(ctx, file, dest))
        .await
}

/// Fetch the first URL of `file` into `dest`, replacing any stale copy
async fn download(ctx: &WorkerContext, file: &PatchFile, dest: &Path) -> FileResult<Fetch> {
    let url = file.urls.first().ok_or(FileError::NoUrl)?;
    remove_if_exists(dest).await?;

    let response = ctx.http.inner().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FileError::HttpStatus {
            url: url.clone(),
            status,
        });
    }

    let mut out = tokio::fs::File::create(dest).await?;
    if response.content_length().is_some() {
        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                () = ctx.cancel.cancelled() => return Ok(Fetch::Cancelled),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            ctx.progress.add_downloaded(chunk.len() as u64);
        }
    } else {
        let data = response.bytes().await?;
        out.write_all(&data).await?;
        ctx.progress.add_downloaded(data.len() as u64);
    }
    out.flush().await?;

    Ok(Fetch::Complete)
}

/// Digest of a file, computed comparable to `expected`
async fn hash_file(path: &Path, expected: &ContentHash) -> FileResult<ContentHash> {
    let path = path.to_path_buf();
    let mut checksum = expected.checksum();
    tokio::task::spawn_blocking(move || -> FileResult<ContentHash> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        std::io::copy(&mut reader, &mut checksum)?;
        Ok(checksum.finalize())
    })
    .await
    .map_err(|e| FileError::Task(e.to_string()))?
}

/// Run the patch engine on a blocking thread
async fn apply_patch(
    source: &Path,
    patch: &Path,
    target: &Path,
    block_size: usize,
) -> FileResult<u64> {
    let (source, patch, target) = (source.to_path_buf(), patch.to_path_buf(), target.to_path_buf());
    tokio::task::spawn_blocking(move || -> FileResult<u64> {
        let source = BufReader::new(File::open(source)?);
        let patch = BufReader::new(File::open(patch)?);
        let target = BufWriter::new(File::create(target)?);
        Ok(FuelPatcher::new(source, patch, target)
            .with_block_size(block_size)
            .apply()?)
    })
    .await
    .map_err(|e| FileError::Task(e.to_string()))?
}

async fn remove_if_exists(path: &Path) -> FileResult<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
