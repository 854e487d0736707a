//! promptcut CLI
//!
//! # Usage
//!
//! ```bash
//! promptcut edit --input video.mp4 --actions '[{"type":"trim","start":0,"end":10}]'
//! promptcut prompt --input video.mp4 --prompt "make it look vintage and add music"
//! promptcut inspect --input video.mp4 --json
//! promptcut plan --input video.mp4 --actions-file actions.json
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use promptcut::actions::parse_actions;
use promptcut::app::{EditOrchestrator, EditOutcome, Job};
use promptcut::cli::{Cli, Commands, EditArgs, InspectArgs, PlanArgs, PromptArgs};
use promptcut::compiler::GraphCompiler;
use promptcut::config::EditConfig;
use promptcut::engine::FfmpegEngine;
use promptcut::intent::LlmIntentParser;
use promptcut::library::MusicLibrary;
use promptcut::ports::{EnginePort, ProbePort, TranscribePort};
use promptcut::probe::FfprobeProber;
use promptcut::subtitles::CommandTranscriber;
use promptcut::EditAction;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditConfig::from_file(path)?,
        None => EditConfig::from_env(),
    };

    match cli.command {
        Commands::Edit(args) => execute_edit(args, config).await,
        Commands::Prompt(args) => execute_prompt(args, config).await,
        Commands::Inspect(args) => execute_inspect(args, config).await,
        Commands::Plan(args) => execute_plan(args, config).await,
    }
}

fn build_orchestrator(config: EditConfig) -> Result<EditOrchestrator> {
    let probe = Arc::new(FfprobeProber::new(&config.ffprobe_path)?) as Arc<dyn ProbePort>;
    let engine = Arc::new(FfmpegEngine::new(&config)?);
    let intent = Arc::new(LlmIntentParser::new(&config));
    let transcriber = config
        .transcribe_command
        .clone()
        .map(|cmd| Arc::new(CommandTranscriber::new(cmd)) as Arc<dyn TranscribePort>);
    Ok(EditOrchestrator::new(
        config,
        probe,
        engine,
        intent,
        transcriber,
    ))
}

fn new_job(id: Option<String>, input: &Path) -> Job {
    let id = id.unwrap_or_else(|| format!("job-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")));
    let mut job = Job::new(id, input);
    job.mark_queued();
    job
}

/// Read the action list from inline JSON or a file; accepts either a bare
/// array or the intent-parser envelope {"actions": [...]}.
fn load_raw_actions(inline: Option<&str>, file: Option<&Path>) -> Result<Vec<serde_json::Value>> {
    let raw = match (inline, file) {
        (Some(inline), _) => inline.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --actions or --actions-file is required"),
    };

    let value: serde_json::Value = serde_json::from_str(&raw).context("invalid actions JSON")?;
    match value {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut map) => match map.remove("actions") {
            Some(serde_json::Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("expected an \"actions\" array"),
        },
        _ => anyhow::bail!("expected a JSON array of actions"),
    }
}

fn report_outcome(job: &Job, outcome: &EditOutcome) {
    match outcome {
        EditOutcome::ChatOnly => {
            if let Some(reply) = &job.reply {
                println!("{}", reply);
            } else {
                println!("nothing to do");
            }
        }
        EditOutcome::Unchanged => println!("no actionable stages; input left unchanged"),
        EditOutcome::Edited { output } => println!("wrote {}", output.display()),
    }
    for warning in &job.warnings {
        eprintln!("warning: {}", warning);
    }
}

async fn execute_edit(args: EditArgs, config: EditConfig) -> Result<()> {
    let raw = load_raw_actions(args.actions.as_deref(), args.actions_file.as_deref())?;
    let (actions, warnings) = parse_actions(&raw)?;
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    let orchestrator = build_orchestrator(config)?;
    let mut job = new_job(args.job_id, &args.input);
    let outcome = orchestrator.apply_actions(&mut job, &actions).await?;
    report_outcome(&job, &outcome);
    Ok(())
}

async fn execute_prompt(args: PromptArgs, config: EditConfig) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let mut job = new_job(args.job_id, &args.input);
    info!(prompt = %args.prompt, "processing prompt");
    let outcome = orchestrator.process_prompt(&mut job, &args.prompt).await?;
    report_outcome(&job, &outcome);
    Ok(())
}

async fn execute_inspect(args: InspectArgs, config: EditConfig) -> Result<()> {
    let prober = FfprobeProber::new(&config.ffprobe_path)?;
    let metadata = prober.probe(&args.input).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        println!("duration: {:.3}s", metadata.duration);
        println!("resolution: {}x{}", metadata.width, metadata.height);
        println!(
            "fps: {:.3}{}",
            metadata.fps,
            if metadata.fps_fallback { " (assumed)" } else { "" }
        );
        println!("codec: {}", metadata.codec);
        println!("audio: {}", if metadata.has_audio { "yes" } else { "no" });
    }
    Ok(())
}

async fn execute_plan(args: PlanArgs, config: EditConfig) -> Result<()> {
    let raw = load_raw_actions(args.actions.as_deref(), args.actions_file.as_deref())?;
    let (actions, warnings) = parse_actions(&raw)?;

    let prober = FfprobeProber::new(&config.ffprobe_path)?;
    let metadata = prober.probe(&args.input).await?;

    // the analysis pass is needed only when silence removal is requested
    let silence = match actions.iter().find_map(|a| match a {
        EditAction::RemoveSilence {
            threshold_db,
            min_duration,
        } => Some((*threshold_db, *min_duration)),
        _ => None,
    }) {
        Some((threshold_db, min_duration)) => {
            let threshold_db = threshold_db.unwrap_or(config.silence_threshold_db);
            let min_duration = min_duration.unwrap_or(config.silence_min_duration);
            let engine = FfmpegEngine::new(&config)?;
            Some(
                engine
                    .detect_silence(&args.input, threshold_db, min_duration, metadata.duration)
                    .await?,
            )
        }
        None => None,
    };

    let library = MusicLibrary::scan(&config.music_dir);
    let graph = GraphCompiler::new(&library).compile(&actions, &metadata, silence.as_deref())?;

    for warning in warnings.iter().chain(graph.warnings.iter()) {
        eprintln!("warning: {}", warning);
    }
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
