//! Edit orchestrator - the entry point used by the task executor
//!
//! Pure coordination: resolve the active input, probe, run the analysis pass
//! when silence removal is requested, compile, render, update the job. The
//! compiler itself is a pure function, so concurrent invocations for
//! independent jobs need no locking; the executor guarantees at most one
//! in-flight edit per job id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::actions::{parse_actions, EditAction};
use crate::app::job::{Job, JobStatus};
use crate::compiler::GraphCompiler;
use crate::config::EditConfig;
use crate::error::{EditResult, Warning};
use crate::library::MusicLibrary;
use crate::ports::{EnginePort, IntentPort, ProbePort, RenderRequest, TranscribePort};

/// Result of one orchestrated turn
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The intent parser returned zero actions; nothing was touched
    ChatOnly,
    /// The compiled graph was the identity; the engine was never invoked
    Unchanged,
    /// A new output file was produced
    Edited { output: PathBuf },
}

/// Orchestrates a single edit turn for one job
pub struct EditOrchestrator {
    config: EditConfig,
    library: MusicLibrary,
    probe: Arc<dyn ProbePort>,
    engine: Arc<dyn EnginePort>,
    intent: Arc<dyn IntentPort>,
    transcriber: Option<Arc<dyn TranscribePort>>,
}

impl EditOrchestrator {
    pub fn new(
        config: EditConfig,
        probe: Arc<dyn ProbePort>,
        engine: Arc<dyn EnginePort>,
        intent: Arc<dyn IntentPort>,
        transcriber: Option<Arc<dyn TranscribePort>>,
    ) -> Self {
        let library = MusicLibrary::scan(&config.music_dir);
        Self {
            config,
            library,
            probe,
            engine,
            intent,
            transcriber,
        }
    }

    /// Full turn: parse the prompt, then edit or answer conversationally
    pub async fn process_prompt(&self, job: &mut Job, prompt: &str) -> EditResult<EditOutcome> {
        job.status = JobStatus::Editing;
        let plan = self.intent.parse(prompt).await;
        job.reply = plan.reply.clone();

        if plan.is_conversational() {
            // pure chat turn: the previous edited file must survive untouched
            info!(job = %job.id, "no actions detected, conversational turn");
            job.status = JobStatus::ChatOnly;
            return Ok(EditOutcome::ChatOnly);
        }

        let result = async {
            let (actions, warnings) = parse_actions(&plan.actions)?;
            job.warnings = warnings;
            self.edit(job, &actions).await
        }
        .await;
        self.record(job, result)
    }

    /// Apply an already-typed action list (bypasses the intent parser)
    pub async fn apply_actions(&self, job: &mut Job, actions: &[EditAction]) -> EditResult<EditOutcome> {
        job.status = JobStatus::Editing;
        job.warnings.clear();
        let result = self.edit(job, actions).await;
        self.record(job, result)
    }

    fn record(&self, job: &mut Job, result: EditResult<EditOutcome>) -> EditResult<EditOutcome> {
        match &result {
            Ok(_) => job.status = JobStatus::Completed,
            Err(err) => {
                job.status = JobStatus::Failed;
                // stored verbatim, never summarized
                job.error = Some(err.to_string());
            }
        }
        result
    }

    async fn edit(&self, job: &mut Job, actions: &[EditAction]) -> EditResult<EditOutcome> {
        let input = job.active_input().to_path_buf();
        info!(job = %job.id, input = %input.display(), "starting edit");

        let metadata = self.probe.probe(&input).await?;
        job.metadata = Some(metadata.clone());

        // the analysis pass runs only when silence removal was requested;
        // fields the action leaves unset fall back to the configured defaults
        let silence = match actions.iter().find_map(|a| match a {
            EditAction::RemoveSilence {
                threshold_db,
                min_duration,
            } => Some((*threshold_db, *min_duration)),
            _ => None,
        }) {
            Some((threshold_db, min_duration)) => {
                let threshold_db = threshold_db.unwrap_or(self.config.silence_threshold_db);
                let min_duration = min_duration.unwrap_or(self.config.silence_min_duration);
                Some(
                    self.engine
                        .detect_silence(&input, threshold_db, min_duration, metadata.duration)
                        .await?,
                )
            }
            None => None,
        };

        let compiler = GraphCompiler::new(&self.library);
        let graph = compiler.compile(actions, &metadata, silence.as_deref())?;
        job.warnings.extend(graph.warnings.iter().cloned());

        if graph.is_identity() {
            info!(job = %job.id, "identity graph, engine not invoked");
            return Ok(EditOutcome::Unchanged);
        }

        // caption temp file is job-unique and removed on every exit path
        let captions_file = if graph.wants_subtitles() {
            self.resolve_captions(job, &input).await?
        } else {
            None
        };

        let output = output_path(&input);
        let request = RenderRequest {
            input,
            output: output.clone(),
            graph,
            captions: captions_file.as_ref().map(|f| f.path().to_path_buf()),
            has_audio: metadata.has_audio,
        };
        self.engine.render(&request).await?;

        job.edited_path = Some(output.clone());
        info!(job = %job.id, output = %output.display(), "edit complete");
        Ok(EditOutcome::Edited { output })
    }

    async fn resolve_captions(
        &self,
        job: &mut Job,
        input: &Path,
    ) -> EditResult<Option<tempfile::NamedTempFile>> {
        let Some(transcriber) = &self.transcriber else {
            warn!(job = %job.id, "subtitles requested but no transcriber configured");
            job.warnings.push(Warning::SubtitlesUnavailable {
                reason: "no transcriber configured".to_string(),
            });
            return Ok(None);
        };

        match transcriber.transcribe(input).await {
            Ok(srt) => {
                let file = tempfile::Builder::new()
                    .prefix(&format!("captions_{}_", job.id))
                    .suffix(".srt")
                    .tempfile()?;
                tokio::fs::write(file.path(), srt).await?;
                Ok(Some(file))
            }
            Err(err) => {
                warn!(job = %job.id, error = %err, "transcription failed, skipping subtitles");
                job.warnings.push(Warning::SubtitlesUnavailable {
                    reason: err.to_string(),
                });
                Ok(None)
            }
        }
    }

}

/// Derive a collision-free output path next to the input
fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("mp4");
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    input.with_file_name(format!("{}_edited_{}.{}", stem, stamp, ext))
}
