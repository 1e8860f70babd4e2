//! # change-narrator
//!
//! Turns the files changed between two git versions into first-person
//! "why" narratives suitable for commit messages.
//!
//! Each changed file goes through two completion calls: a comparison of its
//! before and after content, then a rewrite of that answer in the author's
//! own voice. A failure halts the run but keeps every narrative already
//! produced.
//!
//! ## Quick Start
//!
//! ```no_run
//! use change_narrator::ai::OpenAiClient;
//! use change_narrator::config::{CompletionConfig, Settings};
//! use change_narrator::git::VersionIdentifier;
//! use change_narrator::narrative::{generate_change_narratives, PipelineOptions};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = CompletionConfig::from_settings(&Settings::load()?)?;
//! let client = OpenAiClient::from_config(&config)?;
//! let outcome = generate_change_narratives(
//!     ".",
//!     &VersionIdentifier::RelativeHead(0),
//!     &VersionIdentifier::Staged,
//!     &client,
//!     &PipelineOptions::from_config(&config),
//! )
//! .await?;
//! for narrative in &outcome.result().narratives {
//!     println!("{}:\n{}", narrative.path, narrative.text);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod narrative;

pub use crate::cli::Cli;
pub use crate::error::NarrativeError;
pub use crate::narrative::{generate_change_narratives, PipelineOutcome, PipelineResult};

/// The current version of change-narrator.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
