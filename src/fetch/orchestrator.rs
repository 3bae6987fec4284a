use super::catalog::CatalogFetcher;
use super::commits::CommitAggregator;
use super::error::FetchError;
use super::executor::RequestExecutor;
use super::transport::{HttpTransport, Transport};
use crate::config::Config;
use crate::model::{EntityReport, FetchBatch};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{self, JoinError, JoinSet};

const LOG_TARGET: &str = "     fetch";

/// Drives one complete fetch run: the listing first, then every repository's
/// commit history concurrently.
///
/// One task is spawned per repository with no limit at this level; the
/// executor's concurrency gate is what bounds the number of calls in flight.
/// Dropping the future returned by [`FetchOrchestrator::run`] aborts all
/// outstanding tasks, and each aborted task releases whatever gate slot it held.
#[derive(Debug)]
pub struct FetchOrchestrator<T> {
    executor: Arc<RequestExecutor<T>>,
    catalog: CatalogFetcher<T>,
    aggregator: Arc<CommitAggregator<T>>,
}

impl<T: Transport> FetchOrchestrator<T> {
    pub fn new(transport: T, max_concurrent: usize, requests_per_second: u32) -> Result<Self, FetchError> {
        let executor = Arc::new(RequestExecutor::new(transport, max_concurrent, requests_per_second)?);

        Ok(Self {
            catalog: CatalogFetcher::new(Arc::clone(&executor)),
            aggregator: Arc::new(CommitAggregator::new(Arc::clone(&executor))),
            executor,
        })
    }

    #[must_use]
    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    /// Fetch the top `limit` repositories and today's commit authors for each.
    ///
    /// Fails only when `limit` is zero or the listing cannot be retrieved. A
    /// repository whose history cannot be fetched is still part of the batch,
    /// with an empty author list.
    pub async fn run(&self, limit: u32) -> Result<FetchBatch, FetchError> {
        if limit == 0 {
            return Err(FetchError::invalid_config("limit must be at least 1"));
        }

        let fetched_at = Utc::now();

        let summaries = self
            .catalog
            .fetch_top(limit)
            .await
            .map_err(|e| FetchError::CatalogUnavailable { source: Box::new(e) })?;

        let mut tasks = JoinSet::new();
        let mut task_index: HashMap<task::Id, usize> = HashMap::with_capacity(summaries.len());
        for (index, summary) in summaries.iter().enumerate() {
            let aggregator = Arc::clone(&self.aggregator);
            let owner = summary.owner.clone();
            let name = summary.name.clone();

            let handle = tasks.spawn(async move { aggregator.aggregate(&owner, &name, fetched_at).await });
            let _ = task_index.insert(handle.id(), index);
        }

        let outcomes = join_in_spawn_order(tasks, &task_index, summaries.len()).await;

        let reports = summaries
            .into_iter()
            .zip(outcomes)
            .map(|(summary, outcome)| {
                let authors_today = match outcome {
                    Some(Ok(counts)) => counts,
                    Some(Err(e)) => {
                        log::error!(
                            target: LOG_TARGET,
                            "Commit aggregation for '{}' failed, reporting no authors: {e}",
                            summary.key()
                        );
                        Vec::new()
                    }
                    None => Vec::new(),
                };
                EntityReport { summary, authors_today }
            })
            .collect();

        let stats = self.executor.stats();
        log::debug!(
            target: LOG_TARGET,
            "Issued {} requests ({} succeeded, {} failed, at most {} in flight)",
            stats.issued,
            stats.succeeded,
            stats.failed,
            stats.peak_in_flight
        );

        Ok(FetchBatch::new(fetched_at, reports))
    }
}

/// Join every task, placing each outcome at the index its task was spawned for.
///
/// Completion order never matters. A slot stays `None` only if its task id is unknown.
async fn join_in_spawn_order<R: Send + 'static>(
    mut tasks: JoinSet<R>,
    task_index: &HashMap<task::Id, usize>,
    len: usize,
) -> Vec<Option<Result<R, JoinError>>> {
    let mut outcomes: Vec<Option<Result<R, JoinError>>> = (0..len).map(|_| None).collect();

    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, outcome) = match joined {
            Ok((id, value)) => (id, Ok(value)),
            Err(e) => (e.id(), Err(e)),
        };
        if let Some(&index) = task_index.get(&id) {
            outcomes[index] = Some(outcome);
        }
    }

    outcomes
}

impl FetchOrchestrator<HttpTransport> {
    /// Build an orchestrator that talks to the API described by `config`.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let transport = HttpTransport::new(config.access_token(), &config.api_base_url, config.request_timeout())?;
        Ok(Self::new(transport, config.max_concurrent_requests, config.requests_per_second)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::test_utils::ScriptedTransport;
    use crate::model::AuthorCommitCount;
    use core::time::Duration;
    use reqwest::StatusCode;
    use serde_json::json;

    const SEARCH: &str = "search/repositories";

    fn listing(names: &[&str]) -> serde_json::Value {
        let items: Vec<_> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "owner": {"login": "org"},
                    "stargazers_count": 100,
                    "watchers_count": 10,
                    "forks_count": 1,
                    "language": "Rust"
                })
            })
            .collect();
        json!({ "items": items })
    }

    fn commits_endpoint(name: &str) -> String {
        format!("repos/org/{name}/commits")
    }

    fn x2_y1() -> serde_json::Value {
        json!([
            {"commit": {"author": {"name": "x"}}},
            {"commit": {"author": {"name": "y"}}},
            {"commit": {"author": {"name": "x"}}}
        ])
    }

    #[tokio::test]
    async fn test_failed_history_leaves_gap_without_dropping_repository() {
        let transport = ScriptedTransport::new()
            .reply(SEARCH, listing(&["A", "B", "C"]))
            .reply(&commits_endpoint("A"), x2_y1())
            .fail(&commits_endpoint("B"), StatusCode::INTERNAL_SERVER_ERROR)
            .reply(&commits_endpoint("C"), x2_y1());
        let orchestrator = FetchOrchestrator::new(transport, 10, 30).unwrap();

        let batch = orchestrator.run(3).await.unwrap();

        let expected = vec![AuthorCommitCount::new("x", 2), AuthorCommitCount::new("y", 1)];
        let reports = batch.reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].summary.name, "A");
        assert_eq!(reports[0].authors_today, expected);
        assert_eq!(reports[1].summary.name, "B");
        assert!(reports[1].authors_today.is_empty());
        assert_eq!(reports[2].summary.name, "C");
        assert_eq!(reports[2].authors_today, expected);
    }

    #[tokio::test]
    async fn test_catalog_failure_launches_no_aggregation() {
        let transport = ScriptedTransport::new()
            .fail(SEARCH, StatusCode::BAD_GATEWAY)
            .reply(&commits_endpoint("A"), x2_y1());
        let orchestrator = FetchOrchestrator::new(transport.clone(), 10, 30).unwrap();

        let err = orchestrator.run(3).await.unwrap_err();

        assert!(matches!(err, FetchError::CatalogUnavailable { .. }));
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls_to("repos/"), 0);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected_before_any_call() {
        let transport = ScriptedTransport::new().reply(SEARCH, listing(&["A"]));
        let orchestrator = FetchOrchestrator::new(transport.clone(), 10, 30).unwrap();

        let err = orchestrator.run(0).await.unwrap_err();

        assert!(matches!(err, FetchError::ConfigurationInvalid(_)));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_invalid_capacity_is_rejected() {
        assert!(matches!(
            FetchOrchestrator::new(ScriptedTransport::new(), 0, 30),
            Err(FetchError::ConfigurationInvalid(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_slot_serializes_aggregation() {
        let names = ["r1", "r2", "r3", "r4", "r5"];
        let latency = Duration::from_millis(200);

        let mut transport = ScriptedTransport::new().reply(SEARCH, listing(&names));
        for name in names {
            transport = transport
                .reply(&commits_endpoint(name), json!([]))
                .latency_for(&commits_endpoint(name), latency);
        }
        let orchestrator = FetchOrchestrator::new(transport.clone(), 1, 100).unwrap();

        let start = tokio::time::Instant::now();
        let batch = orchestrator.run(5).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(batch.len(), 5);
        assert_eq!(transport.peak_in_flight(), 1);
        assert_eq!(orchestrator.executor().stats().peak_in_flight, 1);
        assert!(elapsed >= latency * 5 && elapsed < latency * 6, "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_follows_rank_not_completion() {
        let names = ["slow", "fast", "medium", "instant"];
        let transport = ScriptedTransport::new()
            .reply(SEARCH, listing(&names))
            .latency_for(&commits_endpoint("slow"), Duration::from_millis(900))
            .latency_for(&commits_endpoint("fast"), Duration::from_millis(100))
            .latency_for(&commits_endpoint("medium"), Duration::from_millis(400));
        for name in names {
            transport.set_reply(&commits_endpoint(name), json!([{"commit": {"author": {"name": name}}}]));
        }
        let orchestrator = FetchOrchestrator::new(transport, 10, 100).unwrap();

        let batch = orchestrator.run(4).await.unwrap();

        let ranked: Vec<_> = batch.reports().iter().map(|r| (r.summary.rank, r.summary.name.as_str())).collect();
        assert_eq!(ranked, [(1, "slow"), (2, "fast"), (3, "medium"), (4, "instant")]);
        for report in batch.reports() {
            assert_eq!(report.authors_today, [AuthorCommitCount::new(report.summary.name.clone(), 1)]);
        }
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_abort_siblings() {
        let transport = ScriptedTransport::new()
            .reply(SEARCH, listing(&["A", "B", "C"]))
            .reply(&commits_endpoint("A"), x2_y1())
            .panic_on(&commits_endpoint("B"))
            .reply(&commits_endpoint("C"), x2_y1());
        let orchestrator = FetchOrchestrator::new(transport, 2, 30).unwrap();

        let batch = orchestrator.run(3).await.unwrap();

        let reports = batch.reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].authors_today.len(), 2);
        assert!(reports[1].authors_today.is_empty());
        assert_eq!(reports[2].authors_today.len(), 2);
        assert_eq!(orchestrator.executor().gate().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_run_releases_all_slots() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let transport = ScriptedTransport::new()
            .reply(SEARCH, listing(&names))
            .latency(Duration::from_secs(60))
            .latency_for(SEARCH, Duration::ZERO);
        for name in names {
            transport.set_reply(&commits_endpoint(name), json!([]));
        }
        let orchestrator = FetchOrchestrator::new(transport.clone(), 3, 100).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(6)).await;
        assert!(outcome.is_err());

        // aborted tasks unwind on their next poll
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(orchestrator.executor().gate().available(), 3);
        assert_eq!(transport.in_flight(), 0);
        assert_eq!(transport.calls_to("repos/"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicked_task_outcome_lands_at_its_own_index() {
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();
        for (index, delay_ms) in [300_u64, 0, 100].into_iter().enumerate() {
            let handle = tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                assert_ne!(index, 1, "aggregation for index 1 blew up");
                index * 10
            });
            let _ = task_index.insert(handle.id(), index);
        }

        let outcomes = join_in_spawn_order(tasks, &task_index, 3).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].as_ref().unwrap().as_ref().unwrap(), &0);
        assert!(outcomes[1].as_ref().unwrap().as_ref().unwrap_err().is_panic());
        assert_eq!(outcomes[2].as_ref().unwrap().as_ref().unwrap(), &20);
    }
}
