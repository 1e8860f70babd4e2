//! Changed-file set between two versions.

use git2::Diff;
use tracing::debug;

use crate::error::{NarrativeError, Result};
use crate::git::accessor::{Snapshot, VersionAccessor};
use crate::git::repository::GitRepository;

/// Returns every path whose content differs between `before` and `after`.
///
/// Added, modified and deleted files are all reported, in git's delta order
/// (sorted by path), so repeated calls on the same versions agree.
pub fn changed_paths(
    repo: &GitRepository,
    before: &dyn VersionAccessor,
    after: &dyn VersionAccessor,
) -> Result<Vec<String>> {
    let git = repo.repository();

    let diff = match (before.snapshot(), after.snapshot()) {
        (Snapshot::Tree(old), Snapshot::Tree(new)) => git.diff_tree_to_tree(Some(old), Some(new), None),
        (Snapshot::Tree(tree), Snapshot::Index) | (Snapshot::Index, Snapshot::Tree(tree)) => {
            git.diff_tree_to_index(Some(tree), None, None)
        }
        (Snapshot::Index, Snapshot::Index) => return Ok(Vec::new()),
    }
    .map_err(NarrativeError::ChangeSet)?;

    let paths = delta_paths(&diff);
    debug!(
        before = %before.version(),
        after = %after.version(),
        count = paths.len(),
        "Computed changed paths"
    );
    Ok(paths)
}

pub(crate) fn delta_paths(diff: &Diff<'_>) -> Vec<String> {
    diff.deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect()
}
