//! Git operations: version resolution, content lookup and change sets.

pub mod accessor;
pub mod changes;
pub mod line_summary;
pub mod repository;
pub mod version;

#[cfg(test)]
pub(crate) mod test_utils;

pub use accessor::{
    fetch, CommittedAccessor, FileContent, Snapshot, VersionAccessor, WorkingTreeAccessor,
    ABSENT_PLACEHOLDER,
};
pub use changes::changed_paths;
pub use repository::{ComparisonSide, GitRepository};
pub use version::VersionIdentifier;
