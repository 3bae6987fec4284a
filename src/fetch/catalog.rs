use super::error::FetchError;
use super::executor::RequestExecutor;
use super::transport::{ApiRequest, Transport};
use crate::model::{EntitySummary, UNKNOWN_LANGUAGE};
use serde::Deserialize;
use std::sync::Arc;

const LOG_TARGET: &str = "   catalog";
const SEARCH_ENDPOINT: &str = "search/repositories";
const SEARCH_QUERY: &str = "stars:>1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<RepositoryItem>,
}

#[derive(Debug, Deserialize)]
struct RepositoryItem {
    name: Option<String>,
    owner: Option<Owner>,
    stargazers_count: Option<u64>,
    watchers_count: Option<u64>,
    forks_count: Option<u64>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: Option<String>,
}

impl RepositoryItem {
    fn into_summary(self, rank: u32) -> EntitySummary {
        EntitySummary {
            name: self.name.unwrap_or_default(),
            owner: self.owner.and_then(|o| o.login).unwrap_or_default(),
            rank,
            stars: self.stargazers_count.unwrap_or(0),
            watchers: self.watchers_count.unwrap_or(0),
            forks: self.forks_count.unwrap_or(0),
            language: self.language.unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        }
    }
}

/// Retrieves the most-starred repositories, in the order the server ranks them.
#[derive(Debug)]
pub struct CatalogFetcher<T> {
    executor: Arc<RequestExecutor<T>>,
}

impl<T: Transport> CatalogFetcher<T> {
    #[must_use]
    pub const fn new(executor: Arc<RequestExecutor<T>>) -> Self {
        Self { executor }
    }

    /// Fetch up to `limit` repositories with a single listing call.
    ///
    /// Ranks are the 1-based positions in the returned listing; nothing is re-sorted.
    pub async fn fetch_top(&self, limit: u32) -> Result<Vec<EntitySummary>, FetchError> {
        let request = ApiRequest::get(SEARCH_ENDPOINT)
            .param("q", SEARCH_QUERY)
            .param("sort", "stars")
            .param("order", "desc")
            .param("per_page", limit);

        let response: SearchResponse = self.executor.execute_as(&request).await?;

        let summaries: Vec<_> = (1..=limit)
            .zip(response.items)
            .map(|(rank, item)| item.into_summary(rank))
            .collect();

        log::info!(target: LOG_TARGET, "Fetched {} of the top {limit} repositories", summaries.len());
        Ok(summaries)
    }
}
