//! Narrate command: per-file change narratives.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use termcolor::{ColorChoice, StandardStream};
use tracing::debug;

use super::output::{write_prompts, write_result, OutputFormat};
use super::CompletionArgs;
use crate::ai::OpenAiClient;
use crate::git::VersionIdentifier;
use crate::narrative::{
    generate_change_narratives, validate_version_pair, PipelineOptions, PipelineOutcome,
};

/// Narrate command options.
#[derive(Parser)]
pub struct NarrateCommand {
    /// Path to the git repository.
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Older version: HEAD, HEAD~N or any commit-ish.
    #[arg(long, value_name = "VERSION", default_value = "HEAD")]
    pub before: VersionIdentifier,

    /// Newer version: STAGED, HEAD, HEAD~N or any commit-ish.
    #[arg(long, value_name = "VERSION", default_value = "STAGED")]
    pub after: VersionIdentifier,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also print every prompt sent to the model.
    #[arg(long)]
    pub show_prompts: bool,

    /// Completion overrides.
    #[command(flatten)]
    pub completion: CompletionArgs,
}

impl NarrateCommand {
    /// Executes the narrate command.
    ///
    /// A rate-limit halt prints the partial output with a notice and
    /// succeeds; any other halt prints the partial output and fails.
    pub async fn execute(self) -> Result<()> {
        validate_version_pair(&self.before, &self.after)?;

        let config = self.completion.load_config()?;
        let client = OpenAiClient::from_config(&config)?;
        let options = PipelineOptions::from_config(&config).with_prompts(self.show_prompts);
        debug!(repo = %self.repo.display(), before = %self.before, after = %self.after, "Running narrate");

        let outcome =
            generate_change_narratives(&self.repo, &self.before, &self.after, &client, &options)
                .await
                .context("Failed to generate change narratives")?;

        self.print(&outcome)?;
        finish(&outcome)
    }

    /// Writes the (possibly partial) result to stdout.
    fn print(&self, outcome: &PipelineOutcome) -> Result<()> {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        let result = outcome.result();
        write_result(&mut stdout, result, self.format)?;
        if self.show_prompts && self.format == OutputFormat::Text {
            if let Some(prompts) = &result.prompts {
                write_prompts(&mut stdout, prompts)?;
            }
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Maps a printed outcome to the command's exit status.
///
/// Rate limiting is reported on stderr but still succeeds; any other halt
/// fails so scripts can tell the output is incomplete.
pub fn finish(outcome: &PipelineOutcome) -> Result<()> {
    match outcome.halt() {
        None => Ok(()),
        Some(halt) if halt.reason.is_rate_limited() => {
            eprintln!("{}", rate_limit_notice(outcome, &halt.path));
            Ok(())
        }
        Some(halt) => bail!("Narrative generation halted: {halt}"),
    }
}

fn rate_limit_notice(outcome: &PipelineOutcome, path: &str) -> String {
    format!(
        "Rate limit exceeded at '{path}'; showing {} completed narrative(s)",
        outcome.result().len()
    )
}
