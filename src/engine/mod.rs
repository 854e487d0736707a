//! Media engine adapter - executes compiled graphs through ffmpeg
//!
//! The compiler's output stays engine-agnostic; this module owns the
//! translation to an ffmpeg invocation and the analysis pass for silence
//! detection. Engine diagnostics are preserved verbatim on failure.

pub mod filtergraph;
pub mod silence;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::EditConfig;
use crate::error::{EditError, EditResult};
use crate::ports::{EnginePort, RenderRequest};
use crate::segmenter::SilenceInterval;

use filtergraph::build_filter_plan;

/// ffmpeg-backed media engine
pub struct FfmpegEngine {
    binary: PathBuf,
    font_path: PathBuf,
}

impl FfmpegEngine {
    /// Resolve the engine binary, preferring an explicit path over `PATH`
    pub fn new(config: &EditConfig) -> EditResult<Self> {
        let binary = which::which(&config.ffmpeg_path).map_err(|_| EditError::EngineNotFound {
            name: config.ffmpeg_path.display().to_string(),
        })?;
        debug!(binary = %binary.display(), "resolved media engine");
        Ok(Self {
            binary,
            font_path: config.font_path.clone(),
        })
    }

    /// Assemble the full argument list for a render
    fn render_args(&self, request: &RenderRequest) -> Vec<OsString> {
        let plan = build_filter_plan(
            &request.graph,
            &self.font_path,
            request.captions.as_deref(),
            request.has_audio,
        );

        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-i".into(),
            request.input.clone().into(),
        ];
        if plan.needs_music_input {
            if let Some(mix) = &request.graph.music {
                args.push("-i".into());
                args.push(mix.track.clone().into());
            }
        }
        if !plan.filtergraph.is_empty() {
            args.push("-filter_complex".into());
            args.push(plan.filtergraph.clone().into());
        }
        args.push("-map".into());
        args.push(plan.video_map.clone().into());
        if let Some(audio_map) = &plan.audio_map {
            args.push("-map".into());
            args.push(audio_map.clone().into());
        }
        if plan.needs_shortest {
            args.push("-shortest".into());
        }
        args.push(request.output.clone().into());
        args
    }
}

#[async_trait::async_trait]
impl EnginePort for FfmpegEngine {
    async fn render(&self, request: &RenderRequest) -> EditResult<()> {
        let args = self.render_args(request);
        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            stages = request.graph.stages.len(),
            "invoking media engine"
        );
        debug!(?args, "engine arguments");

        let output = Command::new(&self.binary).args(&args).output().await?;
        if !output.status.success() {
            return Err(EditError::Engine {
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!(output = %request.output.display(), "render complete");
        Ok(())
    }

    async fn detect_silence(
        &self,
        path: &Path,
        threshold_db: f64,
        min_duration: f64,
        total_duration: f64,
    ) -> EditResult<Vec<SilenceInterval>> {
        info!(
            path = %path.display(),
            threshold_db, min_duration, "running silence analysis pass"
        );
        let filter = format!("silencedetect=noise={}dB:d={}", threshold_db, min_duration);
        let output = Command::new(&self.binary)
            .args(["-hide_banner", "-nostats", "-i"])
            .arg(path)
            .args(["-af", &filter, "-f", "null", "-"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(EditError::Engine {
                diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        // silencedetect reports on stderr
        let log = String::from_utf8_lossy(&output.stderr);
        let intervals = silence::parse_silence_log(&log, total_duration);
        info!(detections = intervals.len(), "silence analysis complete");
        Ok(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{MusicMix, ProcessingGraph, Stage, StageKind};

    fn engine() -> FfmpegEngine {
        FfmpegEngine {
            binary: PathBuf::from("ffmpeg"),
            font_path: PathBuf::from("font.ttf"),
        }
    }

    fn request_with_music(has_audio: bool) -> RenderRequest {
        RenderRequest {
            input: PathBuf::from("/videos/raw.mp4"),
            output: PathBuf::from("/videos/out.mp4"),
            graph: ProcessingGraph {
                stages: vec![Stage::new(StageKind::Speed { factor: 2.0 })],
                music: Some(MusicMix {
                    track: PathBuf::from("/assets/music/world_1.mp3"),
                    volume: 0.3,
                }),
                warnings: Vec::new(),
            },
            captions: None,
            has_audio,
        }
    }

    #[test]
    fn sole_music_lane_stops_at_the_video_length() {
        let args = engine().render_args(&request_with_music(false));
        assert!(args.contains(&OsString::from("-shortest")));
    }

    #[test]
    fn mixed_music_needs_no_shortest_stop() {
        let args = engine().render_args(&request_with_music(true));
        assert!(!args.contains(&OsString::from("-shortest")));
    }
}
