//! Processing graph types
//!
//! A graph is an ordered stage list over a primary video lane and a primary
//! audio lane, plus at most one side audio lane mixed in at the final output
//! stage. Lane wiring is derived from the stage kind, so a temporal stage can
//! never be applied to one lane only.

use std::path::PathBuf;

use serde::Serialize;

use crate::actions::{AspectRatioKind, CropStrategy, FadeKind, TextPosition};
use crate::error::Warning;
use crate::segmenter::KeepSegment;

/// Which lanes a stage touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSet {
    Video,
    Audio,
    Both,
}

/// Known video filter vocabulary; unknown names become skipped stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    Contrast,
    WarmTone,
    CoolTone,
    Retro,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "grayscale" => Some(FilterKind::Grayscale),
            "contrast" => Some(FilterKind::Contrast),
            "warm_tone" => Some(FilterKind::WarmTone),
            "cool_tone" => Some(FilterKind::CoolTone),
            "retro" => Some(FilterKind::Retro),
            _ => None,
        }
    }
}

/// Concrete crop/pad geometry, resolved from metadata at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectGeometry {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Horizontal placement of the source inside the output
    pub x: u32,
    /// Vertical placement of the source inside the output
    pub y: u32,
    /// True pads to the target canvas, false crops into it
    pub pad: bool,
}

/// One atomic transformation applied to one or more lanes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageKind {
    /// Trim+concatenate every keep segment into new unified primary lanes
    CollapseSilence { segments: Vec<KeepSegment> },
    /// Cut both lanes to [start, end) on the current timeline
    Trim { start: f64, end: f64 },
    /// Retime both lanes by the same factor
    Speed { factor: f64 },
    /// Video-local color filter
    Filter { kind: FilterKind },
    /// Video-local text overlay
    DrawText {
        content: String,
        position: TextPosition,
    },
    /// Fade on both lanes; `start` is resolved on the post-edit timeline
    Fade {
        kind: FadeKind,
        start: f64,
        duration: f64,
    },
    /// Video-local aspect-ratio crop or pad
    AspectCrop {
        ratio: AspectRatioKind,
        strategy: CropStrategy,
        geometry: AspectGeometry,
    },
    /// Video-local burned-in captions from the speech-to-text collaborator
    Subtitles,
    /// Stage accepted but intentionally not rendered (PARTIAL)
    Skipped { reason: String },
    /// Identity sentinel: copy input to output unchanged
    Copy,
}

impl StageKind {
    /// Lane wiring is a function of the stage kind; temporal stages always
    /// touch both lanes so video/audio cannot drift.
    pub fn lanes(&self) -> LaneSet {
        match self {
            StageKind::CollapseSilence { .. }
            | StageKind::Trim { .. }
            | StageKind::Speed { .. }
            | StageKind::Fade { .. }
            | StageKind::Copy => LaneSet::Both,
            StageKind::Filter { .. }
            | StageKind::DrawText { .. }
            | StageKind::AspectCrop { .. }
            | StageKind::Subtitles
            | StageKind::Skipped { .. } => LaneSet::Video,
        }
    }

    /// Whether this stage produces actual work for the engine
    pub fn is_actionable(&self) -> bool {
        !matches!(self, StageKind::Skipped { .. } | StageKind::Copy)
    }
}

/// A stage plus its lane wiring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub kind: StageKind,
    pub lanes: LaneSet,
}

impl Stage {
    pub fn new(kind: StageKind) -> Self {
        let lanes = kind.lanes();
        Self { kind, lanes }
    }
}

/// The side audio lane: mixed into the primary audio lane exactly once, at
/// the final output stage, so music timing reflects the edited timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicMix {
    pub track: PathBuf,
    pub volume: f64,
}

/// The compiled, ordered set of stages and lane wiring handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingGraph {
    pub stages: Vec<Stage>,
    pub music: Option<MusicMix>,
    pub warnings: Vec<Warning>,
}

impl ProcessingGraph {
    /// The sentinel graph whose single stage copies input to output unchanged
    pub fn identity() -> Self {
        Self {
            stages: vec![Stage::new(StageKind::Copy)],
            music: None,
            warnings: Vec::new(),
        }
    }

    /// True when rendering would be a byte-identical copy; callers must
    /// special-case this and not invoke the media engine.
    pub fn is_identity(&self) -> bool {
        self.music.is_none() && self.stages.iter().all(|s| !s.kind.is_actionable())
    }

    /// Whether any stage needs captions from the transcriber
    pub fn wants_subtitles(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s.kind, StageKind::Subtitles))
    }
}
