//! Git repository handle and version resolution.

use std::path::Path;

use git2::{Repository, Tree};
use tracing::debug;

use crate::error::{NarrativeError, Result};
use crate::git::accessor::{CommittedAccessor, VersionAccessor, WorkingTreeAccessor};
use crate::git::version::VersionIdentifier;

/// Which end of a comparison an accessor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonSide {
    /// The older snapshot.
    Before,
    /// The newer snapshot.
    After,
}

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|source| NarrativeError::OpenRepository {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened git repository");
        Ok(Self { repo })
    }

    /// Returns the working tree path, if the repository has one.
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Returns the underlying git2 repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Resolves `version` to an accessor for the given side of a comparison.
    ///
    /// `Staged` reads the working copy on the after side and the last
    /// committed tree on the before side.
    pub fn resolve(
        &self,
        version: &VersionIdentifier,
        side: ComparisonSide,
    ) -> Result<Box<dyn VersionAccessor + '_>> {
        match (version, side) {
            (VersionIdentifier::Staged, ComparisonSide::After) => {
                let workdir = self.workdir().ok_or(NarrativeError::BareRepository)?;
                Ok(Box::new(WorkingTreeAccessor::new(workdir)))
            }
            (VersionIdentifier::Staged, ComparisonSide::Before) => {
                let head = VersionIdentifier::RelativeHead(0);
                let tree = self.commit_tree(&head)?;
                Ok(Box::new(CommittedAccessor::new(&self.repo, head, tree)))
            }
            (version, _) => {
                let tree = self.commit_tree(version)?;
                Ok(Box::new(CommittedAccessor::new(
                    &self.repo,
                    version.clone(),
                    tree,
                )))
            }
        }
    }

    /// Returns the tree of the commit `version` names.
    fn commit_tree(&self, version: &VersionIdentifier) -> Result<Tree<'_>> {
        let not_found = |source| NarrativeError::VersionNotFound {
            version: version.to_string(),
            source,
        };

        let spec = version.revspec().ok_or_else(|| {
            NarrativeError::InvalidArgument(format!("{version} does not name a commit"))
        })?;
        let commit = self
            .repo
            .revparse_single(&spec)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(not_found)?;

        debug!(version = %version, commit = %commit.id(), "Resolved version");
        commit.tree().map_err(not_found)
    }
}
