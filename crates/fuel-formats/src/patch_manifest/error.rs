//! Error types for patch plan assembly

use thiserror::Error;

/// Errors raised while assembling a patch manifest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The patch lookup returned nothing for a file that must be fetched
    #[error("No patch descriptor for {path} (target hash {target_hash})")]
    MissingDescriptor {
        /// Manifest path of the file
        path: String,
        /// Hex target hash that went unanswered
        target_hash: String,
    },
}

/// Result type for patch plan assembly
pub type PlanResult<T> = Result<T, PlanError>;
