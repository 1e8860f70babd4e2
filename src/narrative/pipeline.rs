//! Dual-stage narrative pipeline.
//!
//! Each changed file goes through two completion calls: a comparison call
//! that lists plausible reasons for the change, and a refinement call that
//! rewrites that list in the author's own voice. Files are processed one at a
//! time in change-set order. The first failed call stops the whole run; every
//! narrative finished before it is kept and returned as a partial result.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{is_rate_limited, CompletionClient, CompletionRequest};
use crate::config::CompletionConfig;
use crate::error::{NarrativeError, Result};
use crate::git::{
    changed_paths, fetch, ComparisonSide, GitRepository, VersionAccessor, VersionIdentifier,
};
use crate::narrative::prompts::{
    comparison_prompt, refinement_prompt, COMPARISON_ROLE, REFINEMENT_ROLE,
};

/// Progress of a single file through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    /// Not started.
    Pending,
    /// Before and after content are loaded.
    ContentFetched,
    /// Comparison call in flight.
    ComparisonRequested,
    /// Comparison answer received.
    ComparisonReceived,
    /// Refinement call in flight.
    RefinementRequested,
    /// Refined answer received.
    RefinementReceived,
    /// Leading line removed from the refined answer.
    PostProcessed,
    /// Narrative recorded.
    Done,
    /// Abandoned because the run halted.
    Skipped,
}

impl FileStage {
    /// Short human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ContentFetched => "content fetched",
            Self::ComparisonRequested => "comparison requested",
            Self::ComparisonReceived => "comparison received",
            Self::RefinementRequested => "refinement requested",
            Self::RefinementReceived => "refinement received",
            Self::PostProcessed => "post-processed",
            Self::Done => "done",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final explanation for one changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNarrative {
    /// Repository-relative path.
    pub path: String,
    /// First-person narrative text.
    pub text: String,
}

/// Narratives in change-set order, plus the optional prompt trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    /// Completed narratives, in the order the files were processed.
    pub narratives: Vec<ChangeNarrative>,
    /// Every prompt issued, in order, when tracing was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<String>>,
}

impl PipelineResult {
    /// Returns the narrative text for `path`, if one was completed.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.narratives
            .iter()
            .find(|n| n.path == path)
            .map(|n| n.text.as_str())
    }

    /// Returns the completed paths in order.
    pub fn paths(&self) -> Vec<&str> {
        self.narratives.iter().map(|n| n.path.as_str()).collect()
    }

    /// Number of completed narratives.
    pub fn len(&self) -> usize {
        self.narratives.len()
    }

    /// Returns true when no narrative was completed.
    pub fn is_empty(&self) -> bool {
        self.narratives.is_empty()
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// The completion backend is throttling requests.
    RateLimited,
    /// Any other completion failure.
    Completion(String),
    /// File content could not be read or decoded.
    Content(String),
}

impl HaltReason {
    /// Returns true for [`HaltReason::RateLimited`].
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limit exceeded"),
            Self::Completion(msg) => write!(f, "completion failed: {msg}"),
            Self::Content(msg) => write!(f, "content unavailable: {msg}"),
        }
    }
}

/// The file and stage at which a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    /// File being processed when the run stopped.
    pub path: String,
    /// Stage that failed.
    pub stage: FileStage,
    /// Failure classification.
    pub reason: HaltReason,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}' ({})", self.reason, self.path, self.stage)
    }
}

/// Outcome of a pipeline run.
///
/// A halt is not an error: the narratives completed before it are still
/// returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Every changed file has a narrative.
    Completed(PipelineResult),
    /// The run stopped early.
    Halted {
        /// Narratives completed before the halt.
        partial: PipelineResult,
        /// Where and why the run stopped.
        halt: Halt,
    },
}

impl PipelineOutcome {
    /// Returns the (possibly partial) result.
    pub fn result(&self) -> &PipelineResult {
        match self {
            Self::Completed(result) | Self::Halted { partial: result, .. } => result,
        }
    }

    /// Returns the halt, if the run stopped early.
    pub fn halt(&self) -> Option<&Halt> {
        match self {
            Self::Completed(_) => None,
            Self::Halted { halt, .. } => Some(halt),
        }
    }
}

/// Per-run settings for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Model identifier passed to every completion call.
    pub model: String,
    /// Sampling temperature passed to every completion call.
    pub temperature: f32,
    /// Record every prompt issued.
    pub return_prompts: bool,
}

impl PipelineOptions {
    /// Takes model and temperature from the completion configuration.
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            return_prompts: false,
        }
    }

    /// Enables or disables the prompt trace.
    pub fn with_prompts(mut self, return_prompts: bool) -> Self {
        self.return_prompts = return_prompts;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&CompletionConfig::default())
    }
}

/// Removes everything up to and including the first newline.
///
/// Text without a newline is a lone header line and yields an empty string.
pub fn strip_first_line(text: &str) -> &str {
    text.split_once('\n').map_or("", |(_, rest)| rest)
}

/// Rejects version pairs the pipeline cannot compare.
pub fn validate_version_pair(before: &VersionIdentifier, after: &VersionIdentifier) -> Result<()> {
    if before.is_staged() {
        return Err(NarrativeError::InvalidArgument(
            "the before version cannot be STAGED".to_string(),
        ));
    }
    if before == after {
        return Err(NarrativeError::InvalidArgument(format!(
            "before and after versions are both '{before}'"
        )));
    }
    Ok(())
}

/// Generates a narrative for every file changed between `before` and `after`.
///
/// The version pair is validated before the repository is opened, so an
/// invalid pair never reaches git or the completion client. Version
/// resolution and change-set failures are returned as errors; failures while
/// processing individual files end the run with [`PipelineOutcome::Halted`].
pub async fn generate_change_narratives<P: AsRef<Path>>(
    repo_path: P,
    before: &VersionIdentifier,
    after: &VersionIdentifier,
    client: &dyn CompletionClient,
    options: &PipelineOptions,
) -> Result<PipelineOutcome> {
    validate_version_pair(before, after)?;

    let repo = GitRepository::open_at(repo_path)?;
    let before_accessor = repo.resolve(before, ComparisonSide::Before)?;
    let after_accessor = repo.resolve(after, ComparisonSide::After)?;

    run_pipeline(
        &repo,
        before_accessor.as_ref(),
        after_accessor.as_ref(),
        client,
        options,
    )
    .await
}

/// Runs the pipeline over already-resolved accessors.
pub async fn run_pipeline(
    repo: &GitRepository,
    before: &dyn VersionAccessor,
    after: &dyn VersionAccessor,
    client: &dyn CompletionClient,
    options: &PipelineOptions,
) -> Result<PipelineOutcome> {
    let paths = changed_paths(repo, before, after)?;
    let backend = client.get_metadata();
    info!(
        before = %before.version(),
        after = %after.version(),
        files = paths.len(),
        model = %options.model,
        provider = %backend.provider,
        endpoint = %backend.endpoint,
        "Generating change narratives"
    );

    let mut run = Run {
        client,
        options,
        narratives: Vec::with_capacity(paths.len()),
        prompts: options.return_prompts.then(Vec::new),
    };

    for (index, path) in paths.iter().enumerate() {
        match run.narrate(before, after, path).await {
            Ok(text) => run.narratives.push(ChangeNarrative {
                path: path.clone(),
                text,
            }),
            Err(halt) => {
                warn!(
                    path = %halt.path,
                    stage = %halt.stage,
                    reason = %halt.reason,
                    completed = run.narratives.len(),
                    "Halting narrative generation"
                );
                for skipped in &paths[index..] {
                    debug!(path = %skipped, stage = %FileStage::Skipped, "File not narrated");
                }
                return Ok(PipelineOutcome::Halted {
                    partial: run.into_result(),
                    halt,
                });
            }
        }
    }

    Ok(PipelineOutcome::Completed(run.into_result()))
}

/// State owned by a single pipeline run.
struct Run<'a> {
    client: &'a dyn CompletionClient,
    options: &'a PipelineOptions,
    narratives: Vec<ChangeNarrative>,
    prompts: Option<Vec<String>>,
}

impl Run<'_> {
    async fn narrate(
        &mut self,
        before: &dyn VersionAccessor,
        after: &dyn VersionAccessor,
        path: &str,
    ) -> std::result::Result<String, Halt> {
        let mut stage = FileStage::Pending;
        let halt_on_content = |e: NarrativeError| Halt {
            path: path.to_string(),
            stage: FileStage::Pending,
            reason: HaltReason::Content(e.to_string()),
        };

        let before_content = fetch(before, path).map_err(halt_on_content)?;
        let after_content = fetch(after, path).map_err(halt_on_content)?;
        advance(path, &mut stage, FileStage::ContentFetched);

        let prompt = comparison_prompt(path, &before_content, &after_content);
        advance(path, &mut stage, FileStage::ComparisonRequested);
        let comparison = self.complete(path, stage, COMPARISON_ROLE, prompt).await?;
        advance(path, &mut stage, FileStage::ComparisonReceived);

        let prompt = refinement_prompt(&comparison);
        advance(path, &mut stage, FileStage::RefinementRequested);
        let refined = self.complete(path, stage, REFINEMENT_ROLE, prompt).await?;
        advance(path, &mut stage, FileStage::RefinementReceived);

        let text = strip_first_line(&refined).to_string();
        advance(path, &mut stage, FileStage::PostProcessed);
        advance(path, &mut stage, FileStage::Done);
        Ok(text)
    }

    async fn complete(
        &mut self,
        path: &str,
        stage: FileStage,
        role: &str,
        prompt: String,
    ) -> std::result::Result<String, Halt> {
        let request = CompletionRequest {
            system_role: Some(role),
            user_prompt: &prompt,
            temperature: self.options.temperature,
            model: &self.options.model,
            max_tokens: None,
            stop: None,
        };
        debug!(path, %stage, prompt_len = prompt.len(), "Sending completion request");
        let response = self.client.complete(request).await;

        // Recorded after the call so a failed prompt still lands in the trace
        if let Some(trace) = self.prompts.as_mut() {
            trace.push(prompt);
        }

        response.map_err(|e| Halt {
            path: path.to_string(),
            stage,
            reason: if is_rate_limited(&e) {
                HaltReason::RateLimited
            } else {
                HaltReason::Completion(format!("{e:#}"))
            },
        })
    }

    fn into_result(self) -> PipelineResult {
        PipelineResult {
            narratives: self.narratives,
            prompts: self.prompts,
        }
    }
}

fn advance(path: &str, stage: &mut FileStage, next: FileStage) {
    debug!(path, from = %stage, to = %next, "File stage transition");
    *stage = next;
}
