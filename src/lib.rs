//! promptcut library
//!
//! Turns an ordered list of typed edit actions into a single coherent
//! processing graph over the video and audio lanes of a source file, and
//! renders it through an external ffmpeg process. The action list normally
//! comes from a natural-language intent parser; the compiler itself is pure
//! and deterministic.

pub mod actions;
pub mod app;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod intent;
pub mod library;
pub mod ports;
pub mod probe;
pub mod segmenter;
pub mod subtitles;

// Re-export commonly used types
pub use actions::EditAction;
pub use app::{EditOrchestrator, EditOutcome, Job, JobStatus};
pub use compiler::{GraphCompiler, ProcessingGraph};
pub use config::EditConfig;
pub use error::{EditError, EditResult, Warning};
pub use probe::MediaMetadata;
pub use segmenter::{KeepSegment, SilenceInterval};
