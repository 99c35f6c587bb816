//! Commit data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit object, as returned in lists of commits and comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// The SHA of the commit.
    pub sha: String,

    /// Link to the commit on github.com.
    #[serde(default)]
    pub html_url: String,

    /// The commit details.
    pub commit: CommitDetails,
}

impl Commit {
    /// A commit with a message and link, but no author details.
    pub fn new(
        sha: impl Into<String>,
        message: impl Into<String>,
        html_url: impl Into<String>,
    ) -> Self {
        Self {
            sha: sha.into(),
            html_url: html_url.into(),
            commit: CommitDetails {
                author: None,
                message: message.into(),
            },
        }
    }

    /// The full commit message.
    pub fn message(&self) -> &str {
        &self.commit.message
    }
}

/// The author and message for a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitDetails {
    /// The author of the commit, which Github omits for some imported commits.
    #[serde(default)]
    pub author: Option<AuthorCommitDetails>,

    /// The commit message.
    pub message: String,
}

/// The author and date for a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCommitDetails {
    /// Author name
    pub name: String,
    /// Author email
    pub email: String,
    /// The date of the commit.
    pub date: DateTime<Utc>,
}
