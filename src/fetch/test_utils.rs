//! In-memory transport for exercising the fetch layer without a network.

use super::error::TransportError;
use super::transport::{ApiRequest, ApiResponse, RateLimitInfo, Transport};
use core::sync::atomic::{AtomicUsize, Ordering};
use core::time::Duration;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Outcome {
    Json(serde_json::Value),
    Status(StatusCode),
    Panic,
}

#[derive(Debug, Default)]
struct Script {
    outcomes: HashMap<String, Outcome>,
    rate_limits: HashMap<String, RateLimitInfo>,
    latencies: HashMap<String, Duration>,
    default_latency: Duration,
}

#[derive(Debug, Default)]
struct CallLog {
    calls: Mutex<Vec<ApiRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Answers each endpoint with a scripted reply after a scripted delay.
///
/// Unscripted endpoints answer with HTTP 404. Clones share the script and the call log,
/// so a test can keep a handle after moving the transport into an executor.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    log: Arc<CallLog>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, endpoint: &str, body: serde_json::Value) -> Self {
        self.set_reply(endpoint, body);
        self
    }

    pub fn set_reply(&self, endpoint: &str, body: serde_json::Value) {
        let _ = self.script.lock().unwrap().outcomes.insert(endpoint.to_string(), Outcome::Json(body));
    }

    pub fn fail(self, endpoint: &str, status: StatusCode) -> Self {
        let _ = self.script.lock().unwrap().outcomes.insert(endpoint.to_string(), Outcome::Status(status));
        self
    }

    pub fn panic_on(self, endpoint: &str) -> Self {
        let _ = self.script.lock().unwrap().outcomes.insert(endpoint.to_string(), Outcome::Panic);
        self
    }

    pub fn rate_limit(self, endpoint: &str, info: RateLimitInfo) -> Self {
        let _ = self.script.lock().unwrap().rate_limits.insert(endpoint.to_string(), info);
        self
    }

    pub fn latency(self, latency: Duration) -> Self {
        self.script.lock().unwrap().default_latency = latency;
        self
    }

    pub fn latency_for(self, endpoint: &str, latency: Duration) -> Self {
        let _ = self.script.lock().unwrap().latencies.insert(endpoint.to_string(), latency);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.log.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.log.calls.lock().unwrap().iter().filter(|r| r.endpoint.starts_with(prefix)).count()
    }

    pub fn in_flight(&self) -> usize {
        self.log.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.log.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight count even when the call is cancelled mid-delay.
struct InFlightGuard<'a>(&'a CallLog);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let _ = self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let (outcome, rate_limit, latency) = {
            let script = self.script.lock().unwrap();
            (
                script.outcomes.get(&request.endpoint).cloned(),
                script.rate_limits.get(&request.endpoint).copied(),
                script.latencies.get(&request.endpoint).copied().unwrap_or(script.default_latency),
            )
        };

        self.log.calls.lock().unwrap().push(request.clone());
        let current = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.log.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.log);

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match outcome {
            Some(Outcome::Json(body)) => Ok(ApiResponse { body, rate_limit }),
            Some(Outcome::Status(status)) => Err(TransportError::Status { status, rate_limit }),
            Some(Outcome::Panic) => panic!("scripted panic for '{}'", request.endpoint),
            None => Err(TransportError::Status {
                status: StatusCode::NOT_FOUND,
                rate_limit,
            }),
        }
    }
}
