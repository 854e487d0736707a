//! Translation of a processing graph into an ffmpeg filter description
//!
//! Pure string construction so stage semantics are testable without the
//! engine binary. Lane labels are threaded through each stage; temporal
//! stages consume and produce both lanes together.

use std::path::Path;

use crate::actions::{CropStrategy, FadeKind, TextPosition};
use crate::compiler::{FilterKind, ProcessingGraph, StageKind};

/// A complete `-filter_complex` plan plus output mappings
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    /// The filtergraph string; empty means no filtering on either lane
    pub filtergraph: String,
    /// `-map` argument for the video lane
    pub video_map: String,
    /// `-map` argument for the audio lane, if any audio reaches the output
    pub audio_map: Option<String>,
    /// True when the music side input must be appended as input #1
    pub needs_music_input: bool,
    /// True when the music side lane is the sole audio: nothing bounds its
    /// duration, so the muxer must stop at the end of the video lane
    pub needs_shortest: bool,
}

struct LaneLabels {
    chains: Vec<String>,
    video: String,
    audio: Option<String>,
    next: usize,
}

impl LaneLabels {
    fn new(has_audio: bool) -> Self {
        Self {
            chains: Vec::new(),
            video: "0:v".to_string(),
            audio: has_audio.then(|| "0:a".to_string()),
            next: 0,
        }
    }

    fn fresh(&mut self, prefix: &str) -> String {
        let label = format!("{}{}", prefix, self.next);
        self.next += 1;
        label
    }

    fn push_video(&mut self, filters: &str) {
        let out = self.fresh("v");
        self.chains
            .push(format!("[{}]{}[{}]", self.video, filters, out));
        self.video = out;
    }

    fn push_audio(&mut self, filters: &str) {
        if let Some(audio) = self.audio.clone() {
            let out = self.fresh("a");
            self.chains.push(format!("[{}]{}[{}]", audio, filters, out));
            self.audio = Some(out);
        }
    }
}

/// Build the filter plan for a compiled graph.
///
/// `captions` must be resolved when the graph contains a subtitles stage;
/// without it the stage contributes nothing (the orchestrator records the
/// PARTIAL warning).
pub fn build_filter_plan(
    graph: &ProcessingGraph,
    font: &Path,
    captions: Option<&Path>,
    has_audio: bool,
) -> FilterPlan {
    let mut lanes = LaneLabels::new(has_audio);

    for stage in &graph.stages {
        match &stage.kind {
            StageKind::CollapseSilence { segments } => {
                collapse_segments(&mut lanes, segments);
            }
            StageKind::Trim { start, end } => {
                lanes.push_video(&format!(
                    "trim=start={}:end={},setpts=PTS-STARTPTS",
                    start, end
                ));
                lanes.push_audio(&format!(
                    "atrim=start={}:end={},asetpts=PTS-STARTPTS",
                    start, end
                ));
            }
            StageKind::Speed { factor } => {
                lanes.push_video(&format!("setpts={:.6}*PTS", 1.0 / factor));
                lanes.push_audio(&format!("atempo={}", factor));
            }
            StageKind::Filter { kind } => {
                lanes.push_video(filter_expr(*kind));
            }
            StageKind::DrawText { content, position } => {
                lanes.push_video(&drawtext_expr(content, *position, font));
            }
            StageKind::Fade {
                kind,
                start,
                duration,
            } => {
                let t = match kind {
                    FadeKind::In => "in",
                    FadeKind::Out => "out",
                };
                lanes.push_video(&format!("fade=t={}:st={}:d={}", t, start, duration));
                lanes.push_audio(&format!("afade=t={}:st={}:d={}", t, start, duration));
            }
            StageKind::AspectCrop {
                strategy, geometry, ..
            } => {
                let expr = match strategy {
                    CropStrategy::Center => format!(
                        "crop=w={}:h={}:x={}:y={}",
                        geometry.width, geometry.height, geometry.x, geometry.y
                    ),
                    CropStrategy::Pad => format!(
                        "pad=w={}:h={}:x={}:y={}:color=black",
                        geometry.width, geometry.height, geometry.x, geometry.y
                    ),
                };
                lanes.push_video(&expr);
            }
            StageKind::Subtitles => {
                if let Some(path) = captions {
                    lanes.push_video(&format!(
                        "subtitles=filename='{}'",
                        escape_filter_value(&path.display().to_string())
                    ));
                }
            }
            StageKind::Skipped { .. } | StageKind::Copy => {}
        }
    }

    // the side lane mixes exactly once, after all temporal reshaping
    let needs_music_input = graph.music.is_some();
    let mut needs_shortest = false;
    if let Some(mix) = &graph.music {
        let bgm = lanes.fresh("bgm");
        lanes
            .chains
            .push(format!("[1:a]volume={}[{}]", mix.volume, bgm));
        match lanes.audio.clone() {
            Some(audio) => {
                let out = lanes.fresh("a");
                lanes.chains.push(format!(
                    "[{}][{}]amix=inputs=2:duration=first:dropout_transition=2[{}]",
                    audio, bgm, out
                ));
                lanes.audio = Some(out);
            }
            // no primary audio: the music becomes the audio lane, and only
            // the video lane carries the edited timeline length
            None => {
                lanes.audio = Some(bgm);
                needs_shortest = true;
            }
        }
    }

    let video_map = if lanes.video == "0:v" {
        "0:v".to_string()
    } else {
        format!("[{}]", lanes.video)
    };
    let audio_map = lanes.audio.map(|a| {
        if a == "0:a" {
            "0:a".to_string()
        } else {
            format!("[{}]", a)
        }
    });

    FilterPlan {
        filtergraph: lanes.chains.join(";"),
        video_map,
        audio_map,
        needs_music_input,
        needs_shortest,
    }
}

fn collapse_segments(lanes: &mut LaneLabels, segments: &[crate::segmenter::KeepSegment]) {
    let n = segments.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        let seg = segments[0];
        lanes.push_video(&format!(
            "trim=start={}:end={},setpts=PTS-STARTPTS",
            seg.start, seg.end
        ));
        lanes.push_audio(&format!(
            "atrim=start={}:end={},asetpts=PTS-STARTPTS",
            seg.start, seg.end
        ));
        return;
    }

    let split_outs: Vec<String> = (0..n).map(|i| format!("sv{}_{}", lanes.next, i)).collect();
    lanes.chains.push(format!(
        "[{}]split={}{}",
        lanes.video,
        n,
        split_outs
            .iter()
            .map(|l| format!("[{}]", l))
            .collect::<String>()
    ));

    let audio_outs: Option<Vec<String>> = lanes.audio.clone().map(|audio| {
        let outs: Vec<String> = (0..n).map(|i| format!("sa{}_{}", lanes.next, i)).collect();
        lanes.chains.push(format!(
            "[{}]asplit={}{}",
            audio,
            n,
            outs.iter().map(|l| format!("[{}]", l)).collect::<String>()
        ));
        outs
    });

    let mut concat_inputs = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let cv = format!("cv{}_{}", lanes.next, i);
        lanes.chains.push(format!(
            "[{}]trim=start={}:end={},setpts=PTS-STARTPTS[{}]",
            split_outs[i], seg.start, seg.end, cv
        ));
        concat_inputs.push_str(&format!("[{}]", cv));

        if let Some(audio_outs) = &audio_outs {
            let ca = format!("ca{}_{}", lanes.next, i);
            lanes.chains.push(format!(
                "[{}]atrim=start={}:end={},asetpts=PTS-STARTPTS[{}]",
                audio_outs[i], seg.start, seg.end, ca
            ));
            concat_inputs.push_str(&format!("[{}]", ca));
        }
    }

    let out_v = lanes.fresh("v");
    if audio_outs.is_some() {
        let out_a = lanes.fresh("a");
        lanes.chains.push(format!(
            "{}concat=n={}:v=1:a=1[{}][{}]",
            concat_inputs, n, out_v, out_a
        ));
        lanes.audio = Some(out_a);
    } else {
        lanes.chains.push(format!(
            "{}concat=n={}:v=1:a=0[{}]",
            concat_inputs, n, out_v
        ));
    }
    lanes.video = out_v;
}

fn filter_expr(kind: FilterKind) -> &'static str {
    match kind {
        FilterKind::Grayscale => "hue=s=0",
        FilterKind::Contrast => "eq=contrast=1.5",
        FilterKind::WarmTone => "colorbalance=rs=0.1:gs=0.02:bs=-0.1",
        FilterKind::CoolTone => "colorbalance=rs=-0.1:gs=0.0:bs=0.1",
        FilterKind::Retro => "curves=preset=vintage,noise=alls=8:allf=t",
    }
}

fn drawtext_expr(content: &str, position: TextPosition, font: &Path) -> String {
    let y = match position {
        TextPosition::Top => "h*0.08",
        TextPosition::Bottom => "h-text_h-h*0.08",
        TextPosition::Center => "(h-text_h)/2",
    };
    format!(
        "drawtext=fontfile='{}':text='{}':fontsize=64:fontcolor=white:borderw=2:bordercolor=black:x=(w-text_w)/2:y={}",
        escape_filter_value(&font.display().to_string()),
        escape_filter_value(content),
        y
    )
}

/// Escape a value embedded in a single-quoted filter argument
fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{AspectRatioKind, EditAction};
    use crate::compiler::{GraphCompiler, MusicMix, ProcessingGraph, Stage};
    use crate::library::MusicLibrary;
    use crate::probe::MediaMetadata;
    use std::path::PathBuf;

    fn metadata() -> MediaMetadata {
        MediaMetadata {
            duration: 10.0,
            width: 1920,
            height: 1080,
            fps: 30.0,
            fps_fallback: false,
            codec: "h264".to_string(),
            has_audio: true,
        }
    }

    fn compile(actions: &[EditAction]) -> ProcessingGraph {
        let library = MusicLibrary::default();
        GraphCompiler::new(&library)
            .compile(actions, &metadata(), None)
            .unwrap()
    }

    #[test]
    fn trim_applies_matching_filters_to_both_lanes() {
        let graph = compile(&[EditAction::Trim {
            start: 1.0,
            end: 4.0,
        }]);
        let plan = build_filter_plan(&graph, Path::new("font.ttf"), None, true);

        assert!(plan.filtergraph.contains("trim=start=1:end=4,setpts=PTS-STARTPTS"));
        assert!(plan.filtergraph.contains("atrim=start=1:end=4,asetpts=PTS-STARTPTS"));
        assert_eq!(plan.video_map, "[v0]");
        assert_eq!(plan.audio_map.as_deref(), Some("[a1]"));
    }

    #[test]
    fn music_mix_is_last_and_appears_once() {
        let mut graph = compile(&[EditAction::Speed { factor: 2.0 }]);
        graph.music = Some(MusicMix {
            track: PathBuf::from("/assets/horror_1.mp3"),
            volume: 0.3,
        });
        let plan = build_filter_plan(&graph, Path::new("font.ttf"), None, true);

        assert!(plan.needs_music_input);
        // amix bounds the mix via duration=first, no extra stop needed
        assert!(!plan.needs_shortest);
        assert_eq!(plan.filtergraph.matches("amix").count(), 1);
        // the mix consumes the retimed audio lane, not the source lane
        let amix_pos = plan.filtergraph.find("amix").unwrap();
        let atempo_pos = plan.filtergraph.find("atempo").unwrap();
        assert!(amix_pos > atempo_pos);
    }

    #[test]
    fn music_without_primary_audio_becomes_the_audio_lane() {
        let mut graph = compile(&[EditAction::Filter {
            name: "grayscale".to_string(),
        }]);
        graph.music = Some(MusicMix {
            track: PathBuf::from("/assets/world_1.mp3"),
            volume: 0.4,
        });
        let plan = build_filter_plan(&graph, Path::new("font.ttf"), None, false);

        assert!(!plan.filtergraph.contains("amix"));
        assert!(plan.filtergraph.contains("[1:a]volume=0.4[bgm"));
        assert!(plan.audio_map.unwrap().starts_with("[bgm"));
        // the unbounded music lane must not extend the output past the video
        assert!(plan.needs_shortest);
    }

    #[test]
    fn video_local_stages_never_touch_the_audio_lane() {
        let graph = compile(&[
            EditAction::Filter {
                name: "grayscale".to_string(),
            },
            EditAction::AddText {
                content: "title".to_string(),
                position: Default::default(),
            },
            EditAction::AspectRatio {
                ratio: AspectRatioKind::Square,
                strategy: Default::default(),
            },
        ]);
        let plan = build_filter_plan(&graph, Path::new("font.ttf"), None, true);

        assert!(plan.filtergraph.contains("hue=s=0"));
        assert!(plan.filtergraph.contains("drawtext"));
        assert!(plan.filtergraph.contains("crop=w=1080:h=1080"));
        // untouched audio maps straight from the source
        assert_eq!(plan.audio_map.as_deref(), Some("0:a"));
    }

    #[test]
    fn collapse_splits_trims_and_concats_both_lanes() {
        let graph = {
            let library = MusicLibrary::default();
            GraphCompiler::new(&library)
                .compile(
                    &[EditAction::RemoveSilence {
                        threshold_db: None,
                        min_duration: None,
                    }],
                    &metadata(),
                    Some(&[
                        crate::segmenter::SilenceInterval {
                            start: 2.0,
                            end: 4.0,
                        },
                        crate::segmenter::SilenceInterval {
                            start: 6.0,
                            end: 8.0,
                        },
                    ]),
                )
                .unwrap()
        };
        let plan = build_filter_plan(&graph, Path::new("font.ttf"), None, true);

        assert!(plan.filtergraph.contains("split=3"));
        assert!(plan.filtergraph.contains("asplit=3"));
        assert!(plan.filtergraph.contains("concat=n=3:v=1:a=1"));
        assert!(plan.filtergraph.contains("trim=start=4:end=6"));
    }

    #[test]
    fn subtitles_stage_needs_a_caption_file() {
        let graph = compile(&[EditAction::AutoSubtitles]);
        let without = build_filter_plan(&graph, Path::new("font.ttf"), None, true);
        assert!(!without.filtergraph.contains("subtitles"));

        let with = build_filter_plan(
            &graph,
            Path::new("font.ttf"),
            Some(Path::new("/tmp/captions_1.srt")),
            true,
        );
        assert!(with.filtergraph.contains("subtitles=filename="));
    }

    #[test]
    fn drawtext_escapes_quotes_and_colons() {
        let expr = drawtext_expr("it's 5:00", TextPosition::Center, Path::new("font.ttf"));
        assert!(expr.contains("it'\\''s 5\\:00"));
    }
}
