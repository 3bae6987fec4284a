//! Flat records derived from a [`FetchBatch`], one shape per downstream table.
//!
//! These are pure projections: every field comes from the batch itself, with the
//! batch's `fetched_at` instant supplying the timestamp and the date.

use crate::model::FetchBatch;
use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

/// A flat row destined for a named table.
pub trait Record: Serialize {
    /// Name of the table the row belongs to.
    const TABLE: &'static str;
}

/// Repository metadata as of the fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub owner: String,
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub language: String,
    pub updated: NaiveDateTime,
}

impl Record for RepositoryRecord {
    const TABLE: &'static str = "repositories";
}

/// Where a repository ranked on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub date: NaiveDate,
    pub repo: String,
    pub position: u32,
}

impl Record for PositionRecord {
    const TABLE: &'static str = "repositories_positions";
}

/// How many commits an author made to a repository on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCommitsRecord {
    pub date: NaiveDate,
    pub repo: String,
    pub author: String,
    #[serde(rename = "commits_num")]
    pub commits: u32,
}

impl Record for AuthorCommitsRecord {
    const TABLE: &'static str = "repositories_authors_commits";
}

#[must_use]
pub fn repository_records(batch: &FetchBatch) -> Vec<RepositoryRecord> {
    let updated = batch.fetched_at.trunc_subsecs(0).naive_utc();

    batch
        .reports()
        .iter()
        .map(|report| {
            let summary = &report.summary;
            RepositoryRecord {
                name: summary.name.clone(),
                owner: summary.owner.clone(),
                stars: summary.stars,
                watchers: summary.watchers,
                forks: summary.forks,
                language: summary.language.clone(),
                updated,
            }
        })
        .collect()
}

#[must_use]
pub fn position_records(batch: &FetchBatch) -> Vec<PositionRecord> {
    let date = batch.fetched_at.date_naive();

    batch
        .reports()
        .iter()
        .map(|report| PositionRecord {
            date,
            repo: report.summary.key(),
            position: report.summary.rank,
        })
        .collect()
}

/// One record per author per repository. Repositories without commits contribute none.
#[must_use]
pub fn author_commit_records(batch: &FetchBatch) -> Vec<AuthorCommitsRecord> {
    let date = batch.fetched_at.date_naive();

    batch
        .reports()
        .iter()
        .flat_map(|report| {
            let repo = report.summary.key();
            report.authors_today.iter().map(move |author| AuthorCommitsRecord {
                date,
                repo: repo.clone(),
                author: author.author.clone(),
                commits: author.commits,
            })
        })
        .collect()
}
