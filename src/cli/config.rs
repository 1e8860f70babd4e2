//! Configuration-related CLI commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::CompletionArgs;
use crate::config::{CompletionConfig, Settings};

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the effective completion configuration as YAML.
    Show(ShowCommand),
    /// Prints the settings file location.
    Path,
}

/// Show command options.
#[derive(Parser)]
pub struct ShowCommand {
    /// Overrides to apply before showing.
    #[command(flatten)]
    pub completion: CompletionArgs,
}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show(show_cmd) => show_cmd.execute(),
            ConfigSubcommands::Path => {
                println!("{}", Settings::get_settings_path()?.display());
                Ok(())
            }
        }
    }
}

impl ShowCommand {
    /// Executes the show command.
    pub fn execute(self) -> Result<()> {
        let config = self.completion.load_config()?;
        print!("{}", render_config(&config)?);
        Ok(())
    }
}

/// Renders `config` as YAML with the API key redacted.
pub fn render_config(config: &CompletionConfig) -> Result<String> {
    serde_yaml::to_string(config).context("Failed to serialize configuration")
}
