//! servicedeck Error Definitions
//!
//! Defines error types used throughout the project.
//!
//! `CoreError` is reserved for conditions that abort a generation job.
//! Recoverable content problems are modelled separately: each content source
//! has its own error type and the pipeline turns them into
//! `pipeline::Degradation`s.

use thiserror::Error;

use super::{JobId, SlideId};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Template Errors
    // =========================================================================
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template contains no slides: {0}")]
    TemplateEmpty(String),

    #[error("Template file corrupted: {0}")]
    TemplateCorrupted(String),

    #[error("Unsupported deck format: {0}")]
    UnsupportedDeckFormat(String),

    #[error("Template contract violated: {0}")]
    ContractViolation(String),

    // =========================================================================
    // Deck Errors
    // =========================================================================
    #[error("Slide index {index} out of range (deck has {len} slides)")]
    SlideOutOfRange { index: usize, len: usize },

    #[error("Duplicate slide id: {0}")]
    DuplicateSlideId(SlideId),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("Failed to save deck to {path}: {reason}")]
    PersistFailed { path: String, reason: String },

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Job already submitted: {0}")]
    DuplicateJob(JobId),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Whether this error is a configuration problem (bad or missing template)
    /// rather than a runtime failure.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CoreError::TemplateNotFound(_)
                | CoreError::TemplateEmpty(_)
                | CoreError::TemplateCorrupted(_)
                | CoreError::UnsupportedDeckFormat(_)
                | CoreError::ContractViolation(_)
        )
    }
}
