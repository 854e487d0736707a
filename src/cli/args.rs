//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the edit command
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Actions as inline JSON (either a bare array or {"actions": [...]})
    #[arg(short, long, conflicts_with = "actions_file")]
    pub actions: Option<String>,

    /// Path to a JSON file with the action list
    #[arg(long)]
    pub actions_file: Option<PathBuf>,

    /// Job identifier (default: derived from the current time)
    #[arg(long)]
    pub job_id: Option<String>,
}

/// Arguments for the prompt command
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Natural-language edit request
    #[arg(short, long)]
    pub prompt: String,

    /// Job identifier (default: derived from the current time)
    #[arg(long)]
    pub job_id: Option<String>,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Actions as inline JSON (either a bare array or {"actions": [...]})
    #[arg(short, long, conflicts_with = "actions_file")]
    pub actions: Option<String>,

    /// Path to a JSON file with the action list
    #[arg(long)]
    pub actions_file: Option<PathBuf>,
}
