//! Speech-to-text adapter for auto subtitles
//!
//! The transcriber is an external collaborator; this adapter runs a
//! user-configured command that writes SRT to a given path. Placeholders
//! `{input}` and `{output}` are substituted before execution.

use std::path::Path;

use tokio::process::Command;
use tracing::info;

use crate::error::{EditError, EditResult};
use crate::ports::TranscribePort;

/// Transcriber backed by a configurable external command
pub struct CommandTranscriber {
    command: String,
}

impl CommandTranscriber {
    pub fn new(command: String) -> Self {
        Self { command }
    }

    fn build_argv(&self, input: &Path, output: &Path) -> Vec<String> {
        self.command
            .split_whitespace()
            .map(|part| {
                part.replace("{input}", &input.display().to_string())
                    .replace("{output}", &output.display().to_string())
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl TranscribePort for CommandTranscriber {
    async fn transcribe(&self, media: &Path) -> EditResult<String> {
        let srt_file = tempfile::Builder::new()
            .prefix("transcribe_")
            .suffix(".srt")
            .tempfile()?;
        let argv = self.build_argv(media, srt_file.path());
        let (program, rest) = argv.split_first().ok_or_else(|| EditError::Transcribe {
            message: "transcribe command is empty".to_string(),
        })?;

        info!(command = %program, media = %media.display(), "running transcriber");
        let output = Command::new(program).args(rest).output().await?;
        if !output.status.success() {
            return Err(EditError::Transcribe {
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let srt = tokio::fs::read_to_string(srt_file.path()).await?;
        if srt.trim().is_empty() {
            return Err(EditError::Transcribe {
                message: "transcriber produced no captions".to_string(),
            });
        }
        Ok(srt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn substitutes_placeholders_into_argv() {
        let transcriber = CommandTranscriber::new("whisper {input} -o {output}".to_string());
        let argv = transcriber.build_argv(&PathBuf::from("/in.mp4"), &PathBuf::from("/out.srt"));
        assert_eq!(argv, vec!["whisper", "/in.mp4", "-o", "/out.srt"]);
    }
}
