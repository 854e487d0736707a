//! Graph compiler - reconciles independent edit actions into one ordered,
//! lane-consistent processing graph
//!
//! Evaluation rules:
//! 1. Silence removal always compiles first: it reshapes the timeline, so
//!    every later time-relative stage must operate on the post-removal
//!    timeline.
//! 2. All other actions apply strictly in caller order, except music, which
//!    is deferred to the side lane and mixed at the final output stage.
//! 3. Temporal stages retime both lanes with a single shared factor/range.
//! 4. Fade-out is resolved in a second pass once the post-edit duration is
//!    known.

pub mod graph;

pub use graph::{
    AspectGeometry, FilterKind, LaneSet, MusicMix, ProcessingGraph, Stage, StageKind,
};

use tracing::{debug, info, warn};

use crate::actions::{AspectRatioKind, CropStrategy, EditAction, FadeKind};
use crate::error::{CompileError, Warning};
use crate::library::MusicLibrary;
use crate::probe::MediaMetadata;
use crate::segmenter::{keep_segments, SilenceInterval};

/// Audio tempo range the engine renders in a single pass
pub const TEMPO_RANGE: (f64, f64) = (0.5, 2.0);

/// Compiles ordered action lists into processing graphs.
///
/// Pure and deterministic: the same actions, metadata and silence analysis
/// always produce a structurally identical graph, so concurrent invocations
/// for independent jobs need no coordination.
pub struct GraphCompiler<'a> {
    library: &'a MusicLibrary,
}

impl<'a> GraphCompiler<'a> {
    pub fn new(library: &'a MusicLibrary) -> Self {
        Self { library }
    }

    /// Compile validated actions against the probed metadata.
    ///
    /// `silence` carries the engine's analysis pass output and must be
    /// present when the action list requests silence removal.
    pub fn compile(
        &self,
        actions: &[EditAction],
        metadata: &MediaMetadata,
        silence: Option<&[SilenceInterval]>,
    ) -> Result<ProcessingGraph, CompileError> {
        let mut stages: Vec<Stage> = Vec::with_capacity(actions.len() + 1);
        let mut warnings: Vec<Warning> = Vec::new();
        let mut music: Option<MusicMix> = None;
        let mut deferred_fade_outs: Vec<f64> = Vec::new();

        // running post-edit duration, used for fade-out resolution
        let mut timeline = metadata.duration;
        let mut silence_collapsed = false;

        // silence removal is structurally first regardless of list position
        if actions
            .iter()
            .any(|a| matches!(a, EditAction::RemoveSilence { .. }))
        {
            let detections = silence.ok_or(CompileError::MissingSilenceAnalysis)?;
            let segments = keep_segments(detections, metadata.duration)?;
            if segments.is_empty() {
                warn!("all detections cover the input, skipping collapse");
                warnings.push(Warning::AllSilent);
            } else {
                timeline = segments.iter().map(|s| s.span()).sum();
                debug!(
                    segments = segments.len(),
                    timeline, "collapsing silence into unified lanes"
                );
                stages.push(Stage::new(StageKind::CollapseSilence { segments }));
            }
            silence_collapsed = true;
        }

        for action in actions {
            match action {
                EditAction::RemoveSilence { .. } => {
                    // handled above; later duplicates are ignored
                    if silence_collapsed {
                        silence_collapsed = false;
                    } else {
                        warnings.push(Warning::DuplicateSilenceRemoval);
                    }
                }
                EditAction::Trim { start, end } => {
                    if *start >= timeline {
                        warnings.push(Warning::TrimBeyondEnd { start: *start });
                        continue;
                    }
                    let end = end.min(timeline);
                    timeline = end - start;
                    stages.push(Stage::new(StageKind::Trim { start: *start, end }));
                }
                EditAction::Speed { factor } => {
                    let applied = factor.clamp(TEMPO_RANGE.0, TEMPO_RANGE.1);
                    if applied != *factor {
                        // clamp both lanes together so they stay in sync
                        warnings.push(Warning::TempoClamped {
                            requested: *factor,
                            applied,
                        });
                    }
                    timeline /= applied;
                    stages.push(Stage::new(StageKind::Speed { factor: applied }));
                }
                EditAction::Filter { name } => match FilterKind::from_name(name) {
                    Some(kind) => stages.push(Stage::new(StageKind::Filter { kind })),
                    None => {
                        warnings.push(Warning::UnknownFilter { name: name.clone() });
                        stages.push(Stage::new(StageKind::Skipped {
                            reason: format!("unknown filter '{}'", name),
                        }));
                    }
                },
                EditAction::AddText { content, position } => {
                    stages.push(Stage::new(StageKind::DrawText {
                        content: content.clone(),
                        position: *position,
                    }));
                }
                EditAction::Fade { kind, duration } => match kind {
                    FadeKind::In => stages.push(Stage::new(StageKind::Fade {
                        kind: FadeKind::In,
                        start: 0.0,
                        duration: *duration,
                    })),
                    // needs the final duration; resolved after the first pass
                    FadeKind::Out => deferred_fade_outs.push(*duration),
                },
                EditAction::AddMusic { track, volume } => {
                    if music.is_some() {
                        warnings.push(Warning::DuplicateMusic {
                            track: track.clone(),
                        });
                        continue;
                    }
                    match self.library.resolve(track) {
                        Some(path) => {
                            music = Some(MusicMix {
                                track: path.clone(),
                                volume: *volume,
                            });
                        }
                        None => {
                            warn!(track = %track, "music track unresolved, proceeding without mix");
                            warnings.push(Warning::MissingMusicTrack {
                                track: track.clone(),
                            });
                        }
                    }
                }
                EditAction::AutoSubtitles => {
                    stages.push(Stage::new(StageKind::Subtitles));
                }
                EditAction::AspectRatio { ratio, strategy } => {
                    if metadata.width == 0 || metadata.height == 0 {
                        warnings.push(Warning::ActionSkipped {
                            reason: "aspect_ratio needs known dimensions".to_string(),
                        });
                        continue;
                    }
                    let geometry =
                        aspect_geometry(metadata.width, metadata.height, *ratio, *strategy);
                    stages.push(Stage::new(StageKind::AspectCrop {
                        ratio: *ratio,
                        strategy: *strategy,
                        geometry,
                    }));
                }
            }
        }

        // second pass: out-fades land at the end of the resolved timeline
        for duration in deferred_fade_outs {
            let start = (timeline - duration).max(0.0);
            stages.push(Stage::new(StageKind::Fade {
                kind: FadeKind::Out,
                start,
                duration,
            }));
        }

        if stages.is_empty() && music.is_none() {
            info!("no actionable stages, emitting identity graph");
            let mut graph = ProcessingGraph::identity();
            graph.warnings = warnings;
            return Ok(graph);
        }

        Ok(ProcessingGraph {
            stages,
            music,
            warnings,
        })
    }
}

/// Resolve concrete crop/pad geometry for a target aspect ratio.
///
/// Center crops into the source; pad grows the canvas around it. Dimensions
/// are floored (crop) or ceiled (pad) to even values for 4:2:0 output.
pub fn aspect_geometry(
    width: u32,
    height: u32,
    ratio: AspectRatioKind,
    strategy: CropStrategy,
) -> AspectGeometry {
    let (rw, rh) = ratio.as_fraction();
    let (w, h) = (width as u64, height as u64);
    let (rw, rh) = (rw as u64, rh as u64);
    let wider_than_target = w * rh > h * rw;

    match strategy {
        CropStrategy::Center => {
            let (ow, oh) = if wider_than_target {
                (h * rw / rh, h)
            } else {
                (w, w * rh / rw)
            };
            let (ow, oh) = (even_floor(ow), even_floor(oh));
            AspectGeometry {
                width: ow,
                height: oh,
                x: (width - ow) / 2,
                y: (height - oh) / 2,
                pad: false,
            }
        }
        CropStrategy::Pad => {
            let (ow, oh) = if wider_than_target {
                (w, div_ceil(w * rh, rw))
            } else {
                (div_ceil(h * rw, rh), h)
            };
            let (ow, oh) = (even_ceil(ow), even_ceil(oh));
            AspectGeometry {
                width: ow,
                height: oh,
                x: (ow - width) / 2,
                y: (oh - height) / 2,
                pad: true,
            }
        }
    }
}

fn even_floor(v: u64) -> u32 {
    (v - v % 2) as u32
}

fn even_ceil(v: u64) -> u32 {
    (v + v % 2) as u32
}

fn div_ceil(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::TextPosition;
    use std::path::PathBuf;

    fn metadata(duration: f64) -> MediaMetadata {
        MediaMetadata {
            duration,
            width: 1920,
            height: 1080,
            fps: 30.0,
            fps_fallback: false,
            codec: "h264".to_string(),
            has_audio: true,
        }
    }

    fn library_with(track: &str) -> MusicLibrary {
        MusicLibrary::from_entries([(
            track.to_string(),
            PathBuf::from(format!("/assets/music/{}", track)),
        )])
    }

    #[test]
    fn silence_collapse_always_compiles_first() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![
            EditAction::Trim {
                start: 0.0,
                end: 2.0,
            },
            EditAction::RemoveSilence {
                threshold_db: None,
                min_duration: None,
            },
        ];
        let silence = vec![SilenceInterval {
            start: 4.0,
            end: 6.0,
        }];
        let graph = compiler
            .compile(&actions, &metadata(10.0), Some(&silence))
            .unwrap();

        assert!(matches!(
            graph.stages[0].kind,
            StageKind::CollapseSilence { .. }
        ));
        assert!(matches!(graph.stages[1].kind, StageKind::Trim { .. }));
        assert_eq!(graph.stages[0].lanes, LaneSet::Both);
    }

    #[test]
    fn silence_removal_without_analysis_fails_to_compile() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![EditAction::RemoveSilence {
            threshold_db: None,
            min_duration: None,
        }];
        assert_eq!(
            compiler.compile(&actions, &metadata(10.0), None).unwrap_err(),
            CompileError::MissingSilenceAnalysis
        );
    }

    #[test]
    fn music_never_appears_as_a_primary_lane_stage() {
        let library = library_with("horror_1.mp3");
        let compiler = GraphCompiler::new(&library);
        let actions = vec![
            EditAction::AddMusic {
                track: "horror_1.mp3".to_string(),
                volume: 0.3,
            },
            EditAction::Trim {
                start: 1.0,
                end: 4.0,
            },
        ];
        let graph = compiler.compile(&actions, &metadata(10.0), None).unwrap();

        assert_eq!(graph.stages.len(), 1);
        assert!(matches!(graph.stages[0].kind, StageKind::Trim { .. }));
        let mix = graph.music.as_ref().unwrap();
        assert_eq!(mix.track, PathBuf::from("/assets/music/horror_1.mp3"));
        assert_eq!(mix.volume, 0.3);
    }

    #[test]
    fn missing_music_track_degrades_to_partial_warning() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![
            EditAction::AddMusic {
                track: "nope.mp3".to_string(),
                volume: 0.3,
            },
            EditAction::Filter {
                name: "grayscale".to_string(),
            },
        ];
        let graph = compiler.compile(&actions, &metadata(10.0), None).unwrap();
        assert!(graph.music.is_none());
        assert!(graph
            .warnings
            .contains(&Warning::MissingMusicTrack {
                track: "nope.mp3".to_string()
            }));
        // the rest of the compile still succeeds
        assert!(matches!(graph.stages[0].kind, StageKind::Filter { .. }));
    }

    #[test]
    fn unknown_filter_compiles_to_skipped_identity() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![EditAction::Filter {
            name: "unknown_xyz".to_string(),
        }];
        let graph = compiler.compile(&actions, &metadata(10.0), None).unwrap();

        assert_eq!(graph.stages.len(), 1);
        assert!(matches!(graph.stages[0].kind, StageKind::Skipped { .. }));
        assert!(graph.is_identity());
        assert!(graph
            .warnings
            .contains(&Warning::UnknownFilter {
                name: "unknown_xyz".to_string()
            }));
    }

    #[test]
    fn empty_action_list_yields_identity_sentinel() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let graph = compiler.compile(&[], &metadata(10.0), None).unwrap();
        assert!(graph.is_identity());
        assert_eq!(graph.stages, vec![Stage::new(StageKind::Copy)]);
    }

    #[test]
    fn fade_out_resolves_against_post_edit_duration() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![
            EditAction::Fade {
                kind: FadeKind::Out,
                duration: 1.0,
            },
            EditAction::Trim {
                start: 0.0,
                end: 8.0,
            },
            EditAction::Speed { factor: 2.0 },
        ];
        let graph = compiler.compile(&actions, &metadata(10.0), None).unwrap();

        // 10s -> trim to 8s -> speed 2.0 -> 4s; out-fade lands at 3s
        let last = graph.stages.last().unwrap();
        assert_eq!(
            last.kind,
            StageKind::Fade {
                kind: FadeKind::Out,
                start: 3.0,
                duration: 1.0
            }
        );
        assert_eq!(last.lanes, LaneSet::Both);
    }

    #[test]
    fn tempo_outside_supported_range_is_clamped_on_both_lanes() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![EditAction::Speed { factor: 3.0 }];
        let graph = compiler.compile(&actions, &metadata(10.0), None).unwrap();

        assert_eq!(graph.stages[0].kind, StageKind::Speed { factor: 2.0 });
        assert!(graph
            .warnings
            .contains(&Warning::TempoClamped {
                requested: 3.0,
                applied: 2.0
            }));
    }

    #[test]
    fn trim_beyond_edited_timeline_is_skipped() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![EditAction::Trim {
            start: 12.0,
            end: 15.0,
        }];
        let graph = compiler.compile(&actions, &metadata(10.0), None).unwrap();
        assert!(graph.is_identity());
        assert!(graph
            .warnings
            .contains(&Warning::TrimBeyondEnd { start: 12.0 }));
    }

    #[test]
    fn fully_silent_input_skips_collapse_with_warning() {
        let library = MusicLibrary::default();
        let compiler = GraphCompiler::new(&library);
        let actions = vec![EditAction::RemoveSilence {
            threshold_db: None,
            min_duration: None,
        }];
        let silence = vec![SilenceInterval {
            start: 0.0,
            end: 10.0,
        }];
        let graph = compiler
            .compile(&actions, &metadata(10.0), Some(&silence))
            .unwrap();
        assert!(graph.is_identity());
        assert!(graph.warnings.contains(&Warning::AllSilent));
    }

    #[test]
    fn duplicate_music_and_silence_actions_warn_once_each() {
        let library = library_with("positive_1.mp3");
        let compiler = GraphCompiler::new(&library);
        let actions = vec![
            EditAction::RemoveSilence {
                threshold_db: None,
                min_duration: None,
            },
            EditAction::AddMusic {
                track: "positive_1.mp3".to_string(),
                volume: 0.3,
            },
            EditAction::RemoveSilence {
                threshold_db: Some(-20.0),
                min_duration: Some(0.2),
            },
            EditAction::AddMusic {
                track: "positive_1.mp3".to_string(),
                volume: 0.5,
            },
        ];
        let silence = vec![SilenceInterval {
            start: 2.0,
            end: 4.0,
        }];
        let graph = compiler
            .compile(&actions, &metadata(10.0), Some(&silence))
            .unwrap();

        let collapses = graph
            .stages
            .iter()
            .filter(|s| matches!(s.kind, StageKind::CollapseSilence { .. }))
            .count();
        assert_eq!(collapses, 1);
        assert!(graph.warnings.contains(&Warning::DuplicateSilenceRemoval));
        assert!(graph
            .warnings
            .contains(&Warning::DuplicateMusic {
                track: "positive_1.mp3".to_string()
            }));
        // the first mix wins
        assert_eq!(graph.music.as_ref().unwrap().volume, 0.3);
    }

    #[test]
    fn compile_is_deterministic() {
        let library = library_with("world_1.mp3");
        let compiler = GraphCompiler::new(&library);
        let actions = vec![
            EditAction::RemoveSilence {
                threshold_db: None,
                min_duration: None,
            },
            EditAction::Speed { factor: 1.5 },
            EditAction::AddText {
                content: "hello".to_string(),
                position: TextPosition::Top,
            },
            EditAction::AddMusic {
                track: "world_1.mp3".to_string(),
                volume: 0.4,
            },
            EditAction::Fade {
                kind: FadeKind::Out,
                duration: 0.5,
            },
        ];
        let silence = vec![SilenceInterval {
            start: 2.0,
            end: 4.0,
        }];
        let first = compiler
            .compile(&actions, &metadata(10.0), Some(&silence))
            .unwrap();
        let second = compiler
            .compile(&actions, &metadata(10.0), Some(&silence))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn center_crop_geometry_for_vertical_target() {
        let g = aspect_geometry(1920, 1080, AspectRatioKind::Vertical, CropStrategy::Center);
        assert_eq!((g.width, g.height), (606, 1080));
        assert_eq!((g.x, g.y), (657, 0));
        assert!(!g.pad);
    }

    #[test]
    fn pad_geometry_for_square_target() {
        let g = aspect_geometry(1920, 1080, AspectRatioKind::Square, CropStrategy::Pad);
        assert_eq!((g.width, g.height), (1920, 1920));
        assert_eq!((g.x, g.y), (0, 420));
        assert!(g.pad);
    }
}
