//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::Result;
use change_narrator::ai::{AiError, ClientMetadata, CompletionClient, CompletionRequest};
use git2::{Repository, Signature};
use tempfile::TempDir;

/// Temporary repository that can commit and stage files.
pub struct TestRepo {
    _temp_dir: TempDir,
    pub repo_path: PathBuf,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();
        let repo = Repository::init(&repo_path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(Self {
            _temp_dir: temp_dir,
            repo_path,
            repo,
        })
    }

    pub fn stage(&self, rel: &str, content: &str) -> Result<()> {
        fs::write(self.repo_path.join(rel), content)?;
        let mut index = self.repo.index()?;
        index.add_path(Path::new(rel))?;
        index.write()?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<git2::Oid> {
        let signature = Signature::now("Test User", "test@example.com")?;
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        Ok(self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?)
    }
}

/// What the stub returns for one call.
pub enum Reply {
    Text(&'static str),
    RateLimited,
}

/// Completion client replaying scripted replies and recording user prompts.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl CompletionClient for ScriptedClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.user_prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        Box::pin(async move {
            match reply {
                Some(Reply::Text(text)) => Ok(text.to_string()),
                Some(Reply::RateLimited) => Err(AiError::RateLimitExceeded.into()),
                None => Err(anyhow::anyhow!("script exhausted")),
            }
        })
    }

    fn get_metadata(&self) -> ClientMetadata {
        ClientMetadata {
            provider: "Scripted".to_string(),
            endpoint: "stub://".to_string(),
        }
    }
}
