//! Error types for PassPrep Core
//!
//! The transforms themselves are permissive by construction: structurally odd
//! but parseable input is defaulted, never rejected. What remains here is:
//! - Upload text that is not JSON at all
//! - Workbook generation against an unapproved plan
//! - Edit operations addressing modules or videos that do not exist

/// Main transform error type
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Upload payload could not be parsed as JSON
    #[error("invalid JSON upload: {0}")]
    MalformedUpload(#[from] serde_json::Error),

    /// Workbook requested for a plan that has not been approved
    #[error("course plan must be approved before generating a workbook")]
    NotApproved,

    /// Edit addressed a module or video index that does not exist
    #[error("{target} index {index} out of range (len {len})")]
    OutOfRange {
        /// What was addressed ("module" or "video")
        target: &'static str,
        /// Requested index
        index: usize,
        /// Current length of the addressed sequence
        len: usize,
    },
}

impl TransformError {
    /// Build an out-of-range error for a module index
    #[inline]
    #[must_use]
    pub fn module_out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange {
            target: "module",
            index,
            len,
        }
    }

    /// Build an out-of-range error for a video index
    #[inline]
    #[must_use]
    pub fn video_out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange {
            target: "video",
            index,
            len,
        }
    }

    /// Check if the error stems from the uploaded payload rather than the caller
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MalformedUpload(_))
    }
}
