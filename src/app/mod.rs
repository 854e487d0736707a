//! Application layer - job model and the edit orchestrator

pub mod job;
pub mod orchestrator;

pub use job::{Job, JobStatus, JobStatusReport};
pub use orchestrator::{EditOrchestrator, EditOutcome};
