//! Job model - the unit of work referenced by the external job store
//!
//! Persistence stays with the external store; this type carries the fields
//! the orchestrator reads and writes during one edit turn.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::probe::MediaMetadata;

/// Job state machine: UPLOADED -> QUEUED -> EDITING -> {COMPLETED | CHAT_ONLY | FAILED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Uploaded,
    Queued,
    Editing,
    Completed,
    ChatOnly,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Uploaded => "UPLOADED",
            JobStatus::Queued => "QUEUED",
            JobStatus::Editing => "EDITING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::ChatOnly => "CHAT_ONLY",
            JobStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// One editing job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub original_path: PathBuf,
    /// Latest edited output; `None` means no edit applied yet
    pub edited_path: Option<PathBuf>,
    pub status: JobStatus,
    /// Reply from the intent parser for the latest turn
    pub reply: Option<String>,
    /// PARTIAL conditions retained for user-facing transparency
    pub warnings: Vec<Warning>,
    /// Failure message, stored verbatim
    pub error: Option<String>,
    pub metadata: Option<MediaMetadata>,
}

impl Job {
    pub fn new(id: impl Into<String>, original_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            original_path: original_path.into(),
            edited_path: None,
            status: JobStatus::Uploaded,
            reply: None,
            warnings: Vec::new(),
            error: None,
            metadata: None,
        }
    }

    /// Chained edits apply to the latest output
    pub fn active_input(&self) -> &Path {
        self.edited_path.as_deref().unwrap_or(&self.original_path)
    }

    pub fn mark_queued(&mut self) {
        self.status = JobStatus::Queued;
    }

    /// Status record exposed to the external API layer
    pub fn status_report(&self) -> JobStatusReport {
        JobStatusReport {
            job_id: self.id.clone(),
            status: self.status.to_string(),
            original_file: self.original_path.display().to_string(),
            duration: self.metadata.as_ref().map(|m| m.duration),
            width: self.metadata.as_ref().map(|m| m.width),
            height: self.metadata.as_ref().map(|m| m.height),
            error: self.error.clone(),
        }
    }
}

/// Job status record for the API layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub job_id: String,
    pub status: String,
    pub original_file: String,
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_input_prefers_the_edited_output() {
        let mut job = Job::new("j1", "/videos/raw.mp4");
        assert_eq!(job.active_input(), Path::new("/videos/raw.mp4"));
        job.edited_path = Some(PathBuf::from("/videos/raw_edited_1.mp4"));
        assert_eq!(job.active_input(), Path::new("/videos/raw_edited_1.mp4"));
    }

    #[test]
    fn status_report_carries_metadata_once_probed() {
        let mut job = Job::new("j1", "/videos/raw.mp4");
        let report = job.status_report();
        assert_eq!(report.job_id, "j1");
        assert_eq!(report.status, "UPLOADED");
        assert_eq!(report.original_file, "/videos/raw.mp4");
        assert_eq!(report.duration, None);
        assert_eq!(report.width, None);
        assert_eq!(report.height, None);
        assert_eq!(report.error, None);

        job.metadata = Some(MediaMetadata {
            duration: 12.5,
            width: 1920,
            height: 1080,
            fps: 30.0,
            fps_fallback: false,
            codec: "h264".to_string(),
            has_audio: true,
        });
        job.status = JobStatus::Failed;
        job.error = Some("media engine failed: boom".to_string());

        let report = job.status_report();
        assert_eq!(report.status, "FAILED");
        assert_eq!(report.duration, Some(12.5));
        assert_eq!(report.width, Some(1920));
        assert_eq!(report.height, Some(1080));
        assert_eq!(report.error.as_deref(), Some("media engine failed: boom"));
    }

    #[test]
    fn status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&JobStatus::ChatOnly).unwrap(),
            "\"CHAT_ONLY\""
        );
        assert_eq!(JobStatus::ChatOnly.to_string(), "CHAT_ONLY");
    }
}
