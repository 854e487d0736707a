//! Metadata extractor - normalizes prober output into `MediaMetadata`
//!
//! The prober is an external `ffprobe` process emitting JSON; parsing is kept
//! pure so malformed-output handling is testable without the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ProbeError;
use crate::ports::ProbePort;

/// Nominal frame rate assumed when the prober reports a malformed rational
pub const FALLBACK_FPS: f64 = 30.0;

/// Canonical media metadata record, produced once per probe call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// True when fps was defaulted because the rational was malformed
    pub fps_fallback: bool,
    /// Video codec identifier
    pub codec: String,
    /// Whether the input carries an audio stream
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Parse an `r_frame_rate` rational like `30000/1001`.
///
/// Returns the frame rate and whether the nominal fallback was applied. A
/// zero denominator is a malformed-metadata condition and maps to
/// [`FALLBACK_FPS`] rather than dividing by zero.
pub fn parse_frame_rate(raw: &str) -> (f64, bool) {
    let mut parts = raw.splitn(2, '/');
    let num = parts.next().and_then(|n| n.trim().parse::<f64>().ok());
    let den = parts.next().and_then(|d| d.trim().parse::<f64>().ok());

    match (num, den) {
        (Some(num), Some(den)) if den > 0.0 && num > 0.0 => (num / den, false),
        // a bare number with no denominator is taken at face value
        (Some(num), None) if num > 0.0 => (num, false),
        _ => (FALLBACK_FPS, true),
    }
}

/// Normalize raw ffprobe JSON into a `MediaMetadata` record
pub fn parse_probe_output(json: &str) -> Result<MediaMetadata, ProbeError> {
    let output: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| ProbeError::Malformed {
            message: e.to_string(),
        })?;

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or(ProbeError::NoVideoStream)?;

    let has_audio = output.streams.iter().any(|s| s.codec_type == "audio");

    let (fps, fps_fallback) = video
        .r_frame_rate
        .as_deref()
        .map(parse_frame_rate)
        .unwrap_or((FALLBACK_FPS, true));
    if fps_fallback {
        warn!(
            rational = video.r_frame_rate.as_deref().unwrap_or(""),
            "malformed frame rate, assuming {} fps", FALLBACK_FPS
        );
    }

    // prefer the stream duration, fall back to the container's
    let duration = video
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            output
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Ok(MediaMetadata {
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps,
        fps_fallback,
        codec: video.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
        has_audio,
    })
}

/// Prober adapter shelling out to ffprobe
pub struct FfprobeProber {
    binary: PathBuf,
}

impl FfprobeProber {
    /// Resolve the ffprobe binary, preferring an explicit path over `PATH`
    pub fn new(binary: &Path) -> Result<Self, ProbeError> {
        let binary = which::which(binary).map_err(|_| ProbeError::ToolNotFound {
            name: binary.display().to_string(),
        })?;
        debug!(binary = %binary.display(), "resolved prober");
        Ok(Self { binary })
    }

    async fn run(&self, path: &Path) -> Result<String, ProbeError> {
        let output = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| ProbeError::Malformed {
            message: format!("invalid UTF-8 from prober: {}", e),
        })
    }
}

#[async_trait::async_trait]
impl ProbePort for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<MediaMetadata, ProbeError> {
        info!(path = %path.display(), "probing media file");
        let json = self.run(path).await?;
        let metadata = parse_probe_output(&json)?;
        info!(
            duration = metadata.duration,
            width = metadata.width,
            height = metadata.height,
            fps = metadata.fps,
            codec = %metadata.codec,
            "probe complete"
        );
        Ok(metadata)
    }
}
