//! Commit comparison models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Commit;

/// How the head of a comparison relates to its base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComparisonStatus {
    /// Head contains every commit in base, plus more.
    Ahead,
    /// Base contains every commit in head, plus more.
    Behind,
    /// Base and head each have commits the other lacks.
    Diverged,
    /// Base and head are the same commit.
    Identical,
    /// A status this client doesn't know about.
    Unknown(String),
}

impl ComparisonStatus {
    /// The status as Github spells it.
    pub fn as_str(&self) -> &str {
        match self {
            ComparisonStatus::Ahead => "ahead",
            ComparisonStatus::Behind => "behind",
            ComparisonStatus::Diverged => "diverged",
            ComparisonStatus::Identical => "identical",
            ComparisonStatus::Unknown(status) => status,
        }
    }
}

impl From<String> for ComparisonStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ahead" => ComparisonStatus::Ahead,
            "behind" => ComparisonStatus::Behind,
            "diverged" => ComparisonStatus::Diverged,
            "identical" => ComparisonStatus::Identical,
            _ => ComparisonStatus::Unknown(value),
        }
    }
}

impl From<ComparisonStatus> for String {
    fn from(value: ComparisonStatus) -> Self {
        match value {
            ComparisonStatus::Unknown(status) => status,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of comparing two commits, `base...head`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitComparison {
    /// How head relates to base.
    pub status: ComparisonStatus,

    /// Link to the comparison on github.com.
    #[serde(default)]
    pub html_url: String,

    /// The best common ancestor of base and head.
    pub merge_base_commit: Commit,

    /// Number of commits in head which are not in base.
    #[serde(default)]
    pub ahead_by: u32,

    /// Number of commits in base which are not in head.
    #[serde(default)]
    pub behind_by: u32,

    /// Total commits listed in this comparison.
    #[serde(default)]
    pub total_commits: u32,

    /// Commits reachable from head but not from base, oldest first.
    #[serde(default)]
    pub commits: Vec<Commit>,
}
