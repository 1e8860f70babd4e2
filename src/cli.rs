//! CLI interface for change-narrator.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{CompletionConfig, Settings};

pub mod config;
pub mod narrate;
pub mod output;
pub mod summary;

pub use narrate::NarrateCommand;
pub use summary::SummaryCommand;

/// change-narrator: explains why files changed, for commit messages.
#[derive(Parser)]
#[command(name = "change-narrator")]
#[command(
    about = "Generates first-person explanations of git changes for commit messages",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Explains each changed file with the two-stage prompt pipeline.
    Narrate(NarrateCommand),
    /// Writes one commit summary for the staged changes (legacy).
    Summary(SummaryCommand),
    /// Configuration inspection.
    Config(config::ConfigCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Narrate(cmd) => cmd.execute().await,
            Commands::Summary(cmd) => cmd.execute().await,
            Commands::Config(cmd) => cmd.execute(),
        }
    }
}

/// Completion settings that can be overridden per invocation.
#[derive(Args, Debug, Default)]
pub struct CompletionArgs {
    /// Model to use (overrides OPENAI_MODEL).
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature between 0.0 and 2.0 (overrides OPENAI_TEMPERATURE).
    #[arg(long)]
    pub temperature: Option<f32>,
}

impl CompletionArgs {
    /// Loads the configuration and applies these overrides.
    pub fn load_config(&self) -> Result<CompletionConfig> {
        let settings = Settings::load().context("Failed to load settings")?;
        CompletionConfig::from_settings(&settings)?
            .with_overrides(self.model.clone(), self.temperature)
            .context("Invalid command-line override")
    }
}
