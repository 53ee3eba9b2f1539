//! Job System Module
//!
//! Tracks deck generation runs and executes them on a background worker pool.

mod payloads;
mod worker;

pub use payloads::*;
pub use worker::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::pipeline::GenerationReport;
use crate::core::JobId;

// =============================================================================
// Job Types
// =============================================================================

/// Lifecycle state of a generation job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    /// Waiting in queue
    #[default]
    Pending,
    /// Picked up by a worker
    Processing,
    /// Deck saved
    Completed,
    /// Stopped by a fatal error
    Failed,
}

impl JobState {
    /// Completed and failed jobs never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One deck generation run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    /// Correlation id
    pub id: JobId,
    pub state: JobState,
    pub progress_percent: u8,
    /// Last published progress message, or the error of a failed job
    pub message: String,
    pub request: GenerationRequest,
    /// Saved deck of a completed job
    pub output_path: Option<PathBuf>,
    pub report: Option<GenerationReport>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Completion timestamp (RFC 3339)
    pub completed_at: Option<String>,
}

impl GenerationJob {
    /// Creates a pending job with a fresh correlation id
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            state: JobState::Pending,
            progress_percent: 0,
            message: "Queued".to_string(),
            request,
            output_path: None,
            report: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    /// Uses a caller-supplied correlation id
    pub fn with_id(mut self, id: impl Into<JobId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn status_report(&self) -> JobStatusReport {
        JobStatusReport {
            job_id: self.id.clone(),
            state: self.state,
            progress_percent: self.progress_percent,
            message: self.message.clone(),
            output_path: self.output_path.clone(),
        }
    }
}

/// Answer to a status query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub job_id: JobId,
    pub state: JobState,
    pub progress_percent: u8,
    pub message: String,
    pub output_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{EventInfo, ServiceCategory};

    fn sample_request() -> GenerationRequest {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        GenerationRequest::new(
            EventInfo::new(date, ServiceCategory::SundayMorning),
            PathBuf::from("/srv/templates/main.deck"),
            PathBuf::from("/srv/decks"),
        )
    }

    #[test]
    fn test_job_creation() {
        let job = GenerationJob::new(sample_request());

        assert!(!job.id.is_empty());
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.progress_percent, 0);
        assert!(!job.is_terminal());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_job_ids_are_unique() {
        let a = GenerationJob::new(sample_request());
        let b = GenerationJob::new(sample_request());
        assert_ne!(a.id, b.id);
        assert_eq!(GenerationJob::new(sample_request()).with_id("req-7").id, "req-7");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_status_report_serialization() {
        let mut job = GenerationJob::new(sample_request()).with_id("job-1");
        job.state = JobState::Completed;
        job.progress_percent = 100;
        job.output_path = Some(PathBuf::from("/srv/decks/generated_decks/a.deck"));

        let value = serde_json::to_value(job.status_report()).unwrap();
        assert_eq!(value["jobId"], "job-1");
        assert_eq!(value["state"], "completed");
        assert_eq!(value["progressPercent"], 100);
        assert_eq!(value["outputPath"], "/srv/decks/generated_decks/a.deck");
    }
}
