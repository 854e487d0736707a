//! Ports - contracts for the external collaborators
//!
//! Each port has one bundled adapter (ffprobe, ffmpeg, an OpenAI-compatible
//! endpoint, an external transcribe command) and a mock in the test suite.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::compiler::ProcessingGraph;
use crate::error::{EditResult, ProbeError};
use crate::intent::ActionPlan;
use crate::probe::MediaMetadata;
use crate::segmenter::SilenceInterval;

/// One render handed to the media engine
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub graph: ProcessingGraph,
    /// Resolved caption file for a subtitles stage, if any
    pub captions: Option<PathBuf>,
    /// Whether the input carries an audio stream
    pub has_audio: bool,
}

/// Port for media duration/resolution/codec probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file and return the canonical metadata record
    async fn probe(&self, path: &Path) -> Result<MediaMetadata, ProbeError>;
}

/// Port for the external media engine process
#[async_trait]
pub trait EnginePort: Send + Sync {
    /// Execute a compiled graph; failures carry the engine diagnostic verbatim
    async fn render(&self, request: &RenderRequest) -> EditResult<()>;

    /// Analysis pass: detect silence intervals in temporal order.
    /// An unterminated final silence closes at `total_duration`.
    async fn detect_silence(
        &self,
        path: &Path,
        threshold_db: f64,
        min_duration: f64,
        total_duration: f64,
    ) -> EditResult<Vec<SilenceInterval>>;
}

/// Port for the natural-language intent parser.
///
/// Contract: given free text, return typed actions plus an optional reply;
/// failures return an empty action list rather than an error.
#[async_trait]
pub trait IntentPort: Send + Sync {
    async fn parse(&self, prompt: &str) -> ActionPlan;
}

/// Port for the speech-to-text collaborator; returns SRT caption text
#[async_trait]
pub trait TranscribePort: Send + Sync {
    async fn transcribe(&self, media: &Path) -> EditResult<String>;
}
