//! Configuration - explicit settings injected at construction
//!
//! No ambient globals: the orchestrator and adapters receive an `EditConfig`
//! built from defaults, an optional TOML file, and the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EditError, EditResult};

/// Environment variable carrying the intent-endpoint API key
pub const API_KEY_ENV: &str = "PROMPTCUT_API_KEY";

/// Process-wide configuration with enumerated fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Media engine binary
    pub ffmpeg_path: PathBuf,
    /// Prober binary
    pub ffprobe_path: PathBuf,
    /// Root directory of the background-music library
    pub music_dir: PathBuf,
    /// Font used for text overlays
    pub font_path: PathBuf,
    /// OpenAI-compatible endpoint base URL for the intent parser
    pub model_endpoint: String,
    /// Model name sent to the intent endpoint
    pub model_name: String,
    /// API key; usually supplied via `PROMPTCUT_API_KEY`
    pub api_key: Option<String>,
    /// External speech-to-text command; `{input}` and `{output}` are
    /// substituted. Unset means subtitles degrade to a PARTIAL warning.
    pub transcribe_command: Option<String>,
    /// Default silence threshold in dBFS
    pub silence_threshold_db: f64,
    /// Default minimum silence duration in seconds
    pub silence_min_duration: f64,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            music_dir: PathBuf::from("assets/music"),
            font_path: PathBuf::from("assets/fonts/Arial.ttf"),
            model_endpoint: "https://api.sambanova.ai/v1".to_string(),
            model_name: "Meta-Llama-3.1-8B-Instruct".to_string(),
            api_key: None,
            transcribe_command: None,
            silence_threshold_db: -30.0,
            silence_min_duration: 0.5,
        }
    }
}

impl EditConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> EditResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: EditConfig = toml::from_str(&raw).map_err(|e| {
            EditError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("failed to parse config {}: {}", path.display(), e),
            ))
        })?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config.with_env_overrides())
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }
}
