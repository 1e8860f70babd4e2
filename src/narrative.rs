//! Change narratives: prompt rendering, the dual-stage pipeline and the
//! legacy single-stage summary.

pub mod legacy;
pub mod pipeline;
pub mod prompts;

pub use legacy::{generate_commit_summary, CommitSummary};
pub use pipeline::{
    generate_change_narratives, run_pipeline, strip_first_line, validate_version_pair,
    ChangeNarrative, FileStage, Halt, HaltReason, PipelineOptions, PipelineOutcome,
    PipelineResult,
};
