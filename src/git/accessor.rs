//! Content lookup for one side of a comparison.
//!
//! A [`VersionAccessor`] is bound to a single version and answers "what did
//! this file contain at that version". Committed versions read blobs out of a
//! git tree; the staged version reads the working copy. A file missing from
//! the version is reported as [`FileContent::Absent`], never as an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, ObjectType, Repository, Tree};
use serde::Serialize;
use tracing::debug;

use crate::error::{NarrativeError, Result};
use crate::git::version::VersionIdentifier;

/// Text rendered in place of a file that does not exist at a version.
pub const ABSENT_PLACEHOLDER: &str = "File does not exist in this version of the repository.";

/// Raw text of a file at one version, or the absence marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileContent {
    /// The file exists and decoded as UTF-8.
    Present(String),
    /// The file does not exist at this version (added or deleted by the change).
    Absent,
}

impl FileContent {
    /// Returns the text used when this content is embedded in a prompt.
    pub fn as_prompt_text(&self) -> &str {
        match self {
            Self::Present(text) => text,
            Self::Absent => ABSENT_PLACEHOLDER,
        }
    }

    /// Returns true for the absence marker.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// What a change-set diff should compare against for one accessor.
pub enum Snapshot<'a> {
    /// A committed tree.
    Tree(&'a Tree<'a>),
    /// The repository index (the staged snapshot).
    Index,
}

/// Capability to read file content at one version.
pub trait VersionAccessor {
    /// Returns the version this accessor is bound to.
    fn version(&self) -> &VersionIdentifier;

    /// Returns the content of `path` (relative to the repository root).
    ///
    /// A missing file yields [`FileContent::Absent`]. Errors are reserved for
    /// lookup failures and content that is not valid UTF-8.
    fn content_of(&self, path: &str) -> Result<FileContent>;

    /// Returns the snapshot used when computing changed paths.
    fn snapshot(&self) -> Snapshot<'_>;
}

/// Reads content from a committed tree.
pub struct CommittedAccessor<'repo> {
    repo: &'repo Repository,
    version: VersionIdentifier,
    tree: Tree<'repo>,
}

impl<'repo> CommittedAccessor<'repo> {
    /// Creates an accessor over `tree`, labelled with `version`.
    pub fn new(repo: &'repo Repository, version: VersionIdentifier, tree: Tree<'repo>) -> Self {
        Self {
            repo,
            version,
            tree,
        }
    }
}

impl VersionAccessor for CommittedAccessor<'_> {
    fn version(&self) -> &VersionIdentifier {
        &self.version
    }

    fn content_of(&self, path: &str) -> Result<FileContent> {
        let entry = match self.tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(FileContent::Absent),
            Err(e) => return Err(self.lookup_error(path, e)),
        };

        // Submodules and directories have no file content at this path.
        if entry.kind() != Some(ObjectType::Blob) {
            debug!(path, kind = ?entry.kind(), "Tree entry is not a blob, treating as absent");
            return Ok(FileContent::Absent);
        }

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| self.lookup_error(path, e))?;

        decode(blob.content().to_vec(), path, &self.version)
    }

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::Tree(&self.tree)
    }
}

impl CommittedAccessor<'_> {
    fn lookup_error(&self, path: &str, source: git2::Error) -> NarrativeError {
        NarrativeError::Lookup {
            path: path.to_string(),
            version: self.version.to_string(),
            source,
        }
    }
}

/// Reads content from the working copy; change detection uses the index.
pub struct WorkingTreeAccessor {
    workdir: PathBuf,
    version: VersionIdentifier,
}

impl WorkingTreeAccessor {
    /// Creates an accessor reading files under `workdir`.
    pub fn new<P: Into<PathBuf>>(workdir: P) -> Self {
        Self {
            workdir: workdir.into(),
            version: VersionIdentifier::Staged,
        }
    }
}

impl VersionAccessor for WorkingTreeAccessor {
    fn version(&self) -> &VersionIdentifier {
        &self.version
    }

    fn content_of(&self, path: &str) -> Result<FileContent> {
        let full_path = self.workdir.join(path);
        if full_path.is_dir() {
            return Ok(FileContent::Absent);
        }

        match fs::read(&full_path) {
            Ok(bytes) => decode(bytes, path, &self.version),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileContent::Absent),
            Err(source) => Err(NarrativeError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::Index
    }
}

fn decode(bytes: Vec<u8>, path: &str, version: &VersionIdentifier) -> Result<FileContent> {
    String::from_utf8(bytes)
        .map(FileContent::Present)
        .map_err(|_| NarrativeError::Decode {
            path: path.to_string(),
            version: version.to_string(),
        })
}

/// Fetches the content of `path` through `accessor`.
pub fn fetch(accessor: &dyn VersionAccessor, path: &str) -> Result<FileContent> {
    let content = accessor.content_of(path)?;
    debug!(
        path,
        version = %accessor.version(),
        absent = content.is_absent(),
        "Fetched file content"
    );
    Ok(content)
}
