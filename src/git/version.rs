//! Version identifiers naming a snapshot of tracked files.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// String form of the uncommitted staged snapshot.
pub const STAGED: &str = "STAGED";

/// String form of the current commit.
pub const HEAD: &str = "HEAD";

/// A reference to one snapshot of the repository.
///
/// Parsed from the string grammar `"HEAD"`, `"STAGED"`, `"HEAD~" INTEGER`, or any
/// other commit hash or ref, which is left for git to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionIdentifier {
    /// A commit hash, branch, tag or other revision git can resolve.
    Committed(String),
    /// The staged snapshot: index for change detection, working copy for content.
    Staged,
    /// `n` commits before `HEAD`; `RelativeHead(0)` is `HEAD` itself.
    RelativeHead(u32),
}

#[allow(clippy::expect_used)] // literal pattern
fn relative_head_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^HEAD~(\d+)$").expect("valid relative head pattern"))
}

impl VersionIdentifier {
    /// Returns whether this is the staged pseudo-version.
    pub fn is_staged(&self) -> bool {
        matches!(self, Self::Staged)
    }

    /// Returns the revision string handed to `git rev-parse`, if any.
    pub fn revspec(&self) -> Option<String> {
        match self {
            Self::Committed(rev) => Some(rev.clone()),
            Self::RelativeHead(0) => Some(HEAD.to_string()),
            Self::RelativeHead(n) => Some(format!("{HEAD}~{n}")),
            Self::Staged => None,
        }
    }
}

impl Default for VersionIdentifier {
    fn default() -> Self {
        Self::RelativeHead(0)
    }
}

impl FromStr for VersionIdentifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("version identifier cannot be empty".to_string());
        }
        if s == STAGED {
            return Ok(Self::Staged);
        }
        if s == HEAD {
            return Ok(Self::RelativeHead(0));
        }
        if let Some(caps) = relative_head_pattern().captures(s) {
            let n = caps[1]
                .parse::<u32>()
                .map_err(|e| format!("invalid commit offset in '{s}': {e}"))?;
            return Ok(Self::RelativeHead(n));
        }
        Ok(Self::Committed(s.to_string()))
    }
}

impl TryFrom<String> for VersionIdentifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionIdentifier> for String {
    fn from(value: VersionIdentifier) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed(rev) => write!(f, "{rev}"),
            Self::Staged => write!(f, "{STAGED}"),
            Self::RelativeHead(0) => write!(f, "{HEAD}"),
            Self::RelativeHead(n) => write!(f, "{HEAD}~{n}"),
        }
    }
}
