//! Error taxonomy for promptcut
//!
//! Fatal conditions are modeled as typed errors; non-fatal conditions that the
//! pipeline survives (missing music asset, unknown filter name, clamped tempo)
//! are [`Warning`] values retained on the job record.

use thiserror::Error;

/// Main error type for edit operations
#[derive(Error, Debug)]
pub enum EditError {
    /// Structurally invalid action, rejects the whole request
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Metadata extraction failed, fatal for the job
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Silence-detection output was malformed while silence removal was requested
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    /// Processing graph could not be constructed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// External media engine failed; diagnostic text preserved verbatim
    #[error("media engine failed: {diagnostic}")]
    Engine { diagnostic: String },

    /// Media engine binary could not be located
    #[error("media engine not found: {name}")]
    EngineNotFound { name: String },

    /// Speech-to-text collaborator failed
    #[error("transcription failed: {message}")]
    Transcribe { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for edit operations
pub type EditResult<T> = std::result::Result<T, EditError>;

/// Validation failure for a single action
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Trim bounds must satisfy 0 <= start < end
    #[error("invalid trim range: start ({start}) must be >= 0 and less than end ({end})")]
    InvalidTrimRange { start: f64, end: f64 },

    /// Speed factor must be positive
    #[error("invalid speed factor: {factor} (must be > 0)")]
    NonPositiveSpeed { factor: f64 },

    /// Required field missing or of the wrong type
    #[error("malformed {action} action: {detail}")]
    Malformed { action: String, detail: String },

    /// Text overlay requires non-empty content
    #[error("add_text requires non-empty content")]
    EmptyText,

    /// Music volume must be in (0, 1]
    #[error("music volume {volume} outside (0, 1]")]
    VolumeOutOfRange { volume: f64 },

    /// Fade duration must be positive
    #[error("fade duration {duration} must be > 0")]
    NonPositiveFade { duration: f64 },
}

impl ValidationError {
    /// Structural errors reject the whole request; the rest skip the one
    /// action and continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ValidationError::InvalidTrimRange { .. } | ValidationError::NonPositiveSpeed { .. }
        )
    }
}

/// Metadata extraction failure
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Input has no video stream
    #[error("no video stream found in input")]
    NoVideoStream,

    /// Prober binary could not be located
    #[error("prober not found: {name}")]
    ToolNotFound { name: String },

    /// Prober process exited with a failure
    #[error("probe failed: {stderr}")]
    ToolFailed { stderr: String },

    /// Prober output could not be parsed
    #[error("malformed probe output: {message}")]
    Malformed { message: String },

    /// I/O error while invoking the prober
    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Silence-detection output violated the segmenter preconditions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentationError {
    /// Detections must arrive sorted by start time
    #[error("silence detections out of order at index {index}: {start} after {previous_end}")]
    OutOfOrder {
        index: usize,
        start: f64,
        previous_end: f64,
    },

    /// A detection interval ran backwards
    #[error("silence interval at index {index} has end ({end}) before start ({start})")]
    NegativeInterval { index: usize, start: f64, end: f64 },

    /// Total duration must be positive
    #[error("total duration {duration} must be > 0")]
    InvalidDuration { duration: f64 },
}

/// Graph construction failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// remove_silence was requested but no silence analysis was supplied
    #[error("silence removal requested but no silence analysis available")]
    MissingSilenceAnalysis,

    /// Segmenter rejected the silence analysis
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
}

/// Non-fatal PARTIAL condition; the job still completes
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Filter name outside the known vocabulary, stage skipped
    UnknownFilter { name: String },
    /// Music track did not resolve in the library, mix skipped
    MissingMusicTrack { track: String },
    /// A second music action was ignored; the side lane mixes exactly once
    DuplicateMusic { track: String },
    /// A second remove_silence action was ignored
    DuplicateSilenceRemoval,
    /// Speed factor clamped to the supported audio-tempo range
    TempoClamped { requested: f64, applied: f64 },
    /// A malformed non-structural action was skipped
    ActionSkipped { reason: String },
    /// Trim started at or beyond the end of the edited timeline
    TrimBeyondEnd { start: f64 },
    /// Every detection covered the input; collapse skipped
    AllSilent,
    /// Subtitles requested but no transcriber is configured or it failed
    SubtitlesUnavailable { reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnknownFilter { name } => write!(f, "unknown filter '{}' skipped", name),
            Warning::MissingMusicTrack { track } => {
                write!(f, "music track '{}' not found, mix skipped", track)
            }
            Warning::DuplicateMusic { track } => {
                write!(f, "additional music track '{}' ignored", track)
            }
            Warning::DuplicateSilenceRemoval => {
                write!(f, "additional remove_silence action ignored")
            }
            Warning::TempoClamped { requested, applied } => {
                write!(f, "speed {} clamped to {} for audio tempo", requested, applied)
            }
            Warning::ActionSkipped { reason } => write!(f, "action skipped: {}", reason),
            Warning::TrimBeyondEnd { start } => {
                write!(f, "trim start {} beyond edited timeline, skipped", start)
            }
            Warning::AllSilent => write!(f, "entire input detected as silence, collapse skipped"),
            Warning::SubtitlesUnavailable { reason } => {
                write!(f, "subtitles unavailable: {}", reason)
            }
        }
    }
}
