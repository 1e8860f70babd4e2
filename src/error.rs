//! Error types for repository access and the narrative pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving versions and reading file content.
///
/// Completion failures are not represented here: they never abort the
/// pipeline and are reported through [`crate::narrative::HaltReason`].
#[derive(Error, Debug)]
pub enum NarrativeError {
    /// The caller supplied an unusable version pair.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A version identifier does not name a commit in the repository.
    #[error("Version '{version}' not found in repository")]
    VersionNotFound {
        /// The identifier as given by the caller.
        version: String,
        /// Underlying git2 lookup failure.
        #[source]
        source: git2::Error,
    },

    /// The repository could not be opened.
    #[error("Failed to open git repository at {}", path.display())]
    OpenRepository {
        /// Path handed to git2.
        path: PathBuf,
        /// Underlying git2 failure.
        #[source]
        source: git2::Error,
    },

    /// The staged version needs a working tree, which bare repositories lack.
    #[error("Repository has no working tree; the STAGED version is unavailable")]
    BareRepository,

    /// Computing the changed-file set failed.
    #[error("Failed to compute changed files: {0}")]
    ChangeSet(#[source] git2::Error),

    /// Looking up a file in a committed tree failed for a reason other than absence.
    #[error("Failed to look up '{path}' at {version}")]
    Lookup {
        /// Repository-relative file path.
        path: String,
        /// Version the lookup was made against.
        version: String,
        /// Underlying git2 failure.
        #[source]
        source: git2::Error,
    },

    /// Reading a working-tree file failed for a reason other than absence.
    #[error("Failed to read '{path}' from the working tree")]
    Io {
        /// Repository-relative file path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid UTF-8.
    #[error("Content of '{path}' at {version} is not valid UTF-8")]
    Decode {
        /// Repository-relative file path.
        path: String,
        /// Version the content was read from.
        version: String,
    },
}

/// Result alias for repository and pipeline operations.
pub type Result<T> = std::result::Result<T, NarrativeError>;
