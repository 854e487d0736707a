//! Command-line interface definitions

pub mod args;

pub use args::{EditArgs, InspectArgs, PlanArgs, PromptArgs};

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// promptcut - compile prompt-derived edit actions into one ffmpeg pass
#[derive(Parser, Debug)]
#[command(name = "promptcut", version, about)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "PROMPTCUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a typed action list to a video
    Edit(EditArgs),
    /// Parse a natural-language request through the intent endpoint and apply it
    Prompt(PromptArgs),
    /// Probe a video and print its metadata
    Inspect(InspectArgs),
    /// Compile an action list and print the processing graph without rendering
    Plan(PlanArgs),
}
