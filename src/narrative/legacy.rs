//! Legacy single-stage commit summary.
//!
//! Classifies the lines of each staged patch and asks for one commit
//! message covering all staged files in a single completion call. Kept
//! separate from the dual-stage pipeline; the two never share prompts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::ai::{CompletionClient, CompletionRequest};
use crate::config::CompletionConfig;
use crate::git::line_summary::{classify_lines, staged_patch, staged_paths};
use crate::git::GitRepository;

/// Lines kept per category (added, modified, deleted) for each file.
pub const SUMMARY_LINE_LIMIT: usize = 3;

const SUMMARY_INSTRUCTIONS: &str = "Generate a summary for the following git changes in a \
software project. Use mostly natural language for description.";

/// Generated commit message and the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Trimmed completion output.
    pub message: String,
    /// The single prompt sent to the backend.
    pub prompt: String,
}

/// Renders one file's block of the summary prompt.
pub fn file_block(path: &str, patch: &str) -> String {
    let summary = classify_lines(patch).render(Some(SUMMARY_LINE_LIMIT));
    format!("Change in file: {path}\nSummary: {summary}\n")
}

/// Wraps the per-file blocks in the summary instructions.
pub fn summary_prompt(blocks: &[String]) -> String {
    format!(
        "{SUMMARY_INSTRUCTIONS}\n\n{}\n\nCommit Message:",
        blocks.concat()
    )
}

/// Builds the summary prompt for everything staged in `repo`.
///
/// Works before the first commit, when every indexed file is new.
pub fn build_summary_prompt(repo: &GitRepository) -> Result<String> {
    let paths = staged_paths(repo)?;

    let blocks = paths
        .iter()
        .map(|path| -> Result<String> {
            let patch = staged_patch(repo, path)?;
            debug!(path, patch_len = patch.len(), "Classified staged patch");
            Ok(file_block(path, &patch))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(summary_prompt(&blocks))
}

/// Generates a single commit summary for the staged changes at `repo_path`.
///
/// Unlike the narrative pipeline, a completion failure here is an error.
pub async fn generate_commit_summary<P: AsRef<Path>>(
    repo_path: P,
    client: &dyn CompletionClient,
    config: &CompletionConfig,
) -> Result<CommitSummary> {
    let repo = GitRepository::open_at(repo_path)?;
    let prompt = build_summary_prompt(&repo)?;
    info!(prompt_len = prompt.len(), model = %config.model, "Requesting commit summary");

    let request = CompletionRequest {
        system_role: None,
        user_prompt: &prompt,
        temperature: config.temperature,
        model: &config.model,
        max_tokens: Some(config.max_tokens),
        stop: config.stop.as_deref(),
    };
    let message = client
        .complete(request)
        .await
        .context("Failed to generate commit summary")?
        .trim()
        .to_string();

    Ok(CommitSummary { message, prompt })
}
