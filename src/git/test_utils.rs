//! Throwaway git repositories for unit tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// A temporary repository with helpers to write, stage and commit files.
pub(crate) struct TestRepo {
    _temp_dir: TempDir,
    pub(crate) path: PathBuf,
    pub(crate) repo: Repository,
}

impl TestRepo {
    /// Initializes an empty repository with a configured committer.
    pub(crate) fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            repo,
        })
    }

    /// Writes a file into the working copy without staging it.
    pub(crate) fn write(&self, rel: &str, content: &str) -> Result<()> {
        self.write_bytes(rel, content.as_bytes())
    }

    fn write_bytes(&self, rel: &str, content: &[u8]) -> Result<()> {
        let full = self.path.join(rel);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, content)?;
        Ok(())
    }

    /// Writes a file and adds it to the index.
    pub(crate) fn write_and_stage(&self, rel: &str, content: &str) -> Result<()> {
        self.write_bytes_and_stage(rel, content.as_bytes())
    }

    /// Writes raw bytes and adds the file to the index.
    pub(crate) fn write_bytes_and_stage(&self, rel: &str, content: &[u8]) -> Result<()> {
        self.write_bytes(rel, content)?;
        let mut index = self.repo.index()?;
        index.add_path(Path::new(rel))?;
        index.write()?;
        Ok(())
    }

    /// Deletes a file from the working copy and the index.
    pub(crate) fn remove_and_stage(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.path.join(rel))?;
        let mut index = self.repo.index()?;
        index.remove_path(Path::new(rel))?;
        index.write()?;
        Ok(())
    }

    /// Commits the current index on top of `HEAD` (if any).
    pub(crate) fn commit(&self, message: &str) -> Result<Oid> {
        let signature = Signature::now("Test User", "test@example.com")?;
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(oid)
    }
}
