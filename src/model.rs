//! Output data model of a fetch run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language reported for repositories whose primary language is unknown.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Number of commits a single author made to a repository during the lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCommitCount {
    pub author: String,
    pub commits: u32,
}

impl AuthorCommitCount {
    #[must_use]
    pub fn new(author: impl Into<String>, commits: u32) -> Self {
        Self {
            author: author.into(),
            commits,
        }
    }
}

/// A repository as it appeared in the ranked listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub owner: String,

    /// 1-based position in the listing, in the order the server returned it.
    pub rank: u32,

    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub language: String,
}

impl EntitySummary {
    /// The `owner/name` key identifying this repository.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A repository together with today's commit authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub summary: EntitySummary,

    /// Empty when the commit history could not be fetched or had no commits.
    pub authors_today: Vec<AuthorCommitCount>,
}

/// The complete, rank-ordered result of one fetch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBatch {
    pub fetched_at: DateTime<Utc>,
    reports: Vec<EntityReport>,
}

impl FetchBatch {
    /// Creates a batch from reports that are already in listing order.
    #[must_use]
    pub fn new(fetched_at: DateTime<Utc>, reports: Vec<EntityReport>) -> Self {
        debug_assert!(
            reports.windows(2).all(|w| w[0].summary.rank < w[1].summary.rank),
            "reports must be in strictly increasing rank order"
        );

        Self { fetched_at, reports }
    }

    #[must_use]
    pub fn reports(&self) -> &[EntityReport] {
        &self.reports
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Total commits across all repositories and authors.
    #[must_use]
    pub fn total_commits(&self) -> u64 {
        self.reports
            .iter()
            .flat_map(|r| &r.authors_today)
            .map(|a| u64::from(a.commits))
            .sum()
    }
}
