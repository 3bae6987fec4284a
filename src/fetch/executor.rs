use super::concurrency_gate::ConcurrencyGate;
use super::error::FetchError;
use super::rate_limiter::RateLimiter;
use super::request_tracker::{RequestStats, RequestTracker};
use super::transport::{ApiRequest, RateLimitInfo, Transport};
use chrono::Utc;
use core::time::Duration;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "  executor";
const MAX_RATE_LIMIT_WAIT_SECS: u64 = 3600;

/// Single choke point for outbound API calls.
///
/// Every call first occupies a [`ConcurrencyGate`] slot and then waits for
/// [`RateLimiter`] admission before reaching the transport. A caller that
/// already holds a slot may therefore still be held back by the rate limit,
/// so effective throughput is bounded by both limits at once.
///
/// Calls are never retried and failures are never swallowed here.
#[derive(Debug)]
pub struct RequestExecutor<T> {
    transport: T,
    gate: Arc<ConcurrencyGate>,
    limiter: RateLimiter,
    tracker: RequestTracker,
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(transport: T, max_concurrent: usize, requests_per_second: u32) -> Result<Self, FetchError> {
        Ok(Self {
            transport,
            gate: ConcurrencyGate::new(max_concurrent)?,
            limiter: RateLimiter::new(requests_per_second)?,
            tracker: RequestTracker::new(),
        })
    }

    /// Issue one call and return its decoded JSON body.
    pub async fn execute(&self, request: &ApiRequest) -> Result<serde_json::Value, FetchError> {
        let _permit = self.gate.acquire().await;
        self.limiter.acquire().await;

        log::debug!(target: LOG_TARGET, "{} {}", request.method, request.endpoint);

        let in_flight = self.tracker.begin();
        let outcome = self.transport.send(request).await;
        in_flight.finish(outcome.is_ok());

        let rate_limit = match &outcome {
            Ok(response) => response.rate_limit,
            Err(e) => e.rate_limit(),
        };
        if let Some(info) = rate_limit {
            self.note_rate_limit(info);
        }

        outcome
            .map(|response| response.body)
            .map_err(|e| FetchError::request_failed(&request.endpoint, e))
    }

    /// Issue one call and deserialize its body into `D`.
    ///
    /// A body that does not have the shape of `D` fails the call just like a transport fault.
    pub async fn execute_as<D: DeserializeOwned>(&self, request: &ApiRequest) -> Result<D, FetchError> {
        let body = self.execute(request).await?;
        serde_json::from_value(body).map_err(|e| FetchError::request_failed(&request.endpoint, e))
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<ConcurrencyGate> {
        &self.gate
    }

    #[must_use]
    pub fn stats(&self) -> RequestStats {
        self.tracker.snapshot()
    }

    /// Hold back new calls until the advertised reset once the quota is used up.
    fn note_rate_limit(&self, info: RateLimitInfo) {
        if info.remaining > 0 {
            return;
        }

        let wait = (info.reset_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(Duration::from_secs(MAX_RATE_LIMIT_WAIT_SECS));

        if wait.is_zero() {
            return;
        }

        if self.gate.pause_for(wait) {
            let resume = info.reset_at.with_timezone(&chrono::Local).format("%T");
            log::warn!(target: LOG_TARGET, "API rate limit exhausted, holding new requests until {resume} ({}s)", wait.as_secs());
        }
    }
}
