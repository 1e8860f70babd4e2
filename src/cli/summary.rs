//! Summary command: legacy single-stage commit summary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::CompletionArgs;
use crate::ai::OpenAiClient;
use crate::narrative::generate_commit_summary;

/// Summary command options.
#[derive(Parser)]
pub struct SummaryCommand {
    /// Path to the git repository.
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Also print the prompt sent to the model.
    #[arg(long)]
    pub show_prompt: bool,

    /// Completion overrides.
    #[command(flatten)]
    pub completion: CompletionArgs,
}

impl SummaryCommand {
    /// Executes the summary command.
    pub async fn execute(self) -> Result<()> {
        let config = self.completion.load_config()?;
        let client = OpenAiClient::from_config(&config)?;

        let summary = generate_commit_summary(&self.repo, &client, &config).await?;

        println!("{}", summary.message);
        if self.show_prompt {
            println!("\n== prompt ==\n{}", summary.prompt);
        }
        Ok(())
    }
}
