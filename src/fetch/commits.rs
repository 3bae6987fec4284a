use super::error::FetchError;
use super::executor::RequestExecutor;
use super::transport::{ApiRequest, Transport};
use crate::model::AuthorCommitCount;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const LOG_TARGET: &str = "   commits";
const COMMIT_LOOKBACK_HOURS: i64 = 24;
const COMMIT_PAGE_SIZE: u8 = 100;

/// Author name used for commits that carry no author identity.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct CommitEvent {
    commit: Option<CommitDetail>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
}

impl CommitEvent {
    fn author_name(self) -> Option<String> {
        self.commit?.author?.name
    }
}

/// Counts, per author, the commits a repository received during the last day.
#[derive(Debug)]
pub struct CommitAggregator<T> {
    executor: Arc<RequestExecutor<T>>,
}

impl<T: Transport> CommitAggregator<T> {
    #[must_use]
    pub const fn new(executor: Arc<RequestExecutor<T>>) -> Self {
        Self { executor }
    }

    /// Per-author commit counts for `owner/name` since `now` minus one day.
    ///
    /// Never fails: when the history cannot be fetched or decoded, a warning is
    /// logged and the repository is reported as having no commits.
    pub async fn aggregate(&self, owner: &str, name: &str, now: DateTime<Utc>) -> Vec<AuthorCommitCount> {
        match self.try_aggregate(owner, name, now).await {
            Ok(counts) => counts,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not fetch recent commits for '{owner}/{name}', reporting none: {e}");
                Vec::new()
            }
        }
    }

    /// Like [`Self::aggregate`], but surfaces the failure.
    ///
    /// Only the first page of up to 100 commits is examined.
    pub async fn try_aggregate(&self, owner: &str, name: &str, now: DateTime<Utc>) -> Result<Vec<AuthorCommitCount>, FetchError> {
        let since = now - chrono::Duration::hours(COMMIT_LOOKBACK_HOURS);
        let request = ApiRequest::get(format!("repos/{owner}/{name}/commits"))
            .param("since", since.to_rfc3339_opts(SecondsFormat::Secs, true))
            .param("per_page", COMMIT_PAGE_SIZE);

        let events: Vec<CommitEvent> = self.executor.execute_as(&request).await?;

        log::debug!(target: LOG_TARGET, "Found {} recent commits for '{owner}/{name}'", events.len());
        Ok(count_by_author(events.into_iter().map(CommitEvent::author_name)))
    }
}

/// Tally authors in first-seen order.
fn count_by_author(authors: impl IntoIterator<Item = Option<String>>) -> Vec<AuthorCommitCount> {
    let mut counts: Vec<AuthorCommitCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for author in authors {
        let author = author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        if let Some(&i) = index.get(&author) {
            counts[i].commits = counts[i].commits.saturating_add(1);
        } else {
            let _ = index.insert(author.clone(), counts.len());
            counts.push(AuthorCommitCount::new(author, 1));
        }
    }

    counts
}
