//! Error types for install operations
//!
//! [`InstallError`] aborts a whole operation. [`FileError`] is scoped to one
//! file of a download pass; sibling files keep going and the failures are
//! collected into the run report.

use fuel_crypto::CryptoError;
use fuel_formats::fuel_patch::FuelPatchError;
use fuel_formats::manifest::ManifestError;
use fuel_formats::patch_manifest::PlanError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that abort an install, update, verify or uninstall operation
#[derive(Error, Debug)]
pub enum InstallError {
    /// Remote or installed manifest could not be decoded or verified
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Patch lookup answers did not cover every file
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Target volume cannot hold the planned transfer
    #[error("Insufficient space: need {required} bytes, {available} available")]
    InsufficientSpace {
        /// Bytes the plan downloads
        required: u64,
        /// Bytes free on the target volume
        available: u64,
    },

    /// No stored manifest for a game that must be installed
    #[error("No installed manifest for game {0}")]
    MissingManifest(String),

    /// No install record for a game
    #[error("Game {0} is not installed")]
    NotInstalled(String),

    /// Transport failure talking to the distribution service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Distribution service answered with a non-success status
    #[error("HTTP status {status} from {operation}")]
    HttpStatus {
        /// Operation or resource requested
        operation: String,
        /// Returned status
        status: StatusCode,
    },

    /// Distribution service answer is missing data or malformed
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    /// Manifest path is absolute or escapes the install directory
    #[error("Invalid path in manifest: {0}")]
    InvalidPath(String),

    /// Install store could not be read or written
    #[error("Store error: {0}")]
    Store(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for install operations
pub type InstallResult<T> = Result<T, InstallError>;

impl InstallError {
    /// Create a service response error
    pub fn invalid_response<S: Into<String>>(reason: S) -> Self {
        Self::InvalidResponse(reason.into())
    }

    /// Create a store error
    pub fn store<S: Into<String>>(reason: S) -> Self {
        Self::Store(reason.into())
    }

    /// Check if a retry of the whole operation may succeed
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Check if the failure is a signature or checksum problem
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Manifest(e) if e.is_integrity_failure())
    }
}

/// Errors scoped to one file of a download pass
#[derive(Error, Debug)]
pub enum FileError {
    /// Downloaded or patched content does not hash to the expected value
    #[error("Checksum mismatch for {what}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Which content failed (`file` or `patch`)
        what: &'static str,
        /// Expected hash, hex
        expected: String,
        /// Computed hash, hex
        actual: String,
    },

    /// Delta body could not be applied
    #[error("Patch error: {0}")]
    Patch(#[from] FuelPatchError),

    /// Transport failure fetching the body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File storage answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Returned status
        status: StatusCode,
    },

    /// Descriptor carries no download URL
    #[error("No download URL")]
    NoUrl,

    /// Hash computation failed
    #[error("Hash error: {0}")]
    Hash(#[from] CryptoError),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task panicked or was cancelled by the runtime
    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Result type for per-file work
pub type FileResult<T> = Result<T, FileError>;

impl FileError {
    /// Check if the content itself was bad
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
            || matches!(self, Self::Patch(e) if e.is_corruption_error())
    }

    /// Check if downloading the same body again may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
