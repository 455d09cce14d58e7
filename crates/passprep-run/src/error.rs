//! Error types for the run ledger
//!
//! Store errors are caller or integration faults and always propagate:
//! - Unknown run ids
//! - Stage skips rejected by the state machine
//! - Lost-update conflicts detected on write
//! - File system and serialization failures
//!
//! Session errors wrap those plus transform failures and precondition checks.

use crate::model::PipelineStage;
use passprep_core::TransformError;

/// Run store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No run with the given id
    #[error("run not found: {0}")]
    RunNotFound(String),

    /// Requested stage skips ahead of the run's current stage
    #[error("invalid stage transition {} -> {to}", display_from(.from))]
    InvalidTransition {
        from: Option<PipelineStage>,
        to: PipelineStage,
    },

    /// Store file changed on disk between read and write
    #[error("store was modified concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },

    /// Reading or writing the store file failed
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file is not a valid run document
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn display_from(from: &Option<PipelineStage>) -> &'static str {
    from.map_or("none", PipelineStage::as_str)
}

impl StoreError {
    /// Check if the error means the addressed run does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RunNotFound(_))
    }

    /// Check if the caller broke the store contract
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::RunNotFound(_) | Self::InvalidTransition { .. })
    }

    /// Check if repeating the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Io(_))
    }
}

/// Session driver error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Upload or edit rejected by the transform pipeline
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Run store rejected an advance
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Operation needs an earlier step that has not happened
    #[error("{0}")]
    Precondition(&'static str),

    /// Validation found no videos to plan
    #[error("project has no videos to plan")]
    InvalidProject,

    /// Artifact could not be encoded
    #[error("failed to encode export: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SessionError {
    /// Check if the error is the caller's to fix rather than a store fault
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::Transform(_) | Self::Precondition(_) | Self::InvalidProject => true,
            Self::Store(err) => err.is_caller_error(),
            Self::Encode(_) => false,
        }
    }
}
