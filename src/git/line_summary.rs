//! Legacy line classification of staged patches.
//!
//! Buckets the lines of a unified diff into added, context ("modified") and
//! deleted lines. Only the legacy single-stage summary uses this; the
//! narrative pipeline works on whole-file content instead.

use std::path::Path;

use git2::{DiffFormat, DiffOptions, ErrorCode, Tree};

use crate::error::{NarrativeError, Result};
use crate::git::changes::delta_paths;
use crate::git::repository::GitRepository;

/// Lines of one file's patch, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuckets {
    /// Lines introduced by the change.
    pub added: Vec<String>,
    /// Unchanged context lines surrounding the change.
    pub modified: Vec<String>,
    /// Removed lines, each prefixed with `"Removed "`.
    pub deleted: Vec<String>,
}

impl LineBuckets {
    /// Renders the non-empty buckets, keeping at most `limit` lines of each.
    pub fn render(&self, limit: Option<usize>) -> String {
        let mut summary = String::new();
        for (label, lines) in [
            ("Added", &self.added),
            ("Modified", &self.modified),
            ("Deleted", &self.deleted),
        ] {
            if lines.is_empty() {
                continue;
            }
            let take = limit.unwrap_or(lines.len());
            let body = lines
                .iter()
                .take(take)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            summary.push_str(&format!("{label}:\n{body}\n\n"));
        }
        summary.trim().to_string()
    }
}

/// Classifies the lines of unified diff text.
pub fn classify_lines(patch: &str) -> LineBuckets {
    let mut buckets = LineBuckets::default();
    for line in patch.split('\n') {
        if let Some(rest) = line.strip_prefix('+') {
            if !line.starts_with("+++") {
                buckets.added.push(rest.to_string());
            }
        } else if let Some(rest) = line.strip_prefix('-') {
            if !line.starts_with("---") {
                buckets.deleted.push(format!("Removed {rest}"));
            }
        } else if let Some(rest) = line.strip_prefix(' ') {
            buckets.modified.push(rest.to_string());
        }
    }
    buckets
}

/// Returns every staged path (`HEAD` against the index), sorted by path.
///
/// Before the first commit every indexed file counts as staged.
pub fn staged_paths(repo: &GitRepository) -> Result<Vec<String>> {
    let head_tree = head_tree(repo)?;
    let diff = repo
        .repository()
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(NarrativeError::ChangeSet)?;
    Ok(delta_paths(&diff))
}

/// Returns the staged unified patch (`HEAD` against the index) for one path.
pub fn staged_patch(repo: &GitRepository, path: &str) -> Result<String> {
    let git = repo.repository();
    let head_tree = head_tree(repo)?;

    let mut opts = DiffOptions::new();
    opts.pathspec(Path::new(path)).disable_pathspec_match(true);
    let diff = git
        .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        .map_err(NarrativeError::ChangeSet)?;

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            text.push(line.origin());
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(NarrativeError::ChangeSet)?;

    Ok(text)
}

/// Returns the `HEAD` tree, or `None` before the first commit.
fn head_tree(repo: &GitRepository) -> Result<Option<Tree<'_>>> {
    let head = match repo.repository().head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(NarrativeError::ChangeSet(e)),
    };
    head.peel_to_tree()
        .map(Some)
        .map_err(NarrativeError::ChangeSet)
}
