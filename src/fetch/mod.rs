//! Concurrent retrieval of the repository listing and per-repository commit history.
//!
//! Data flows strictly downward:
//!
//! ```text
//! FetchOrchestrator -> CatalogFetcher -> CommitAggregator (one task per repository)
//!                   -> RequestExecutor -> ConcurrencyGate, RateLimiter -> Transport
//! ```
//!
//! Only the executor talks to the network. Everything above it is stateless
//! apart from the values it returns.

mod catalog;
mod commits;
mod concurrency_gate;
mod error;
mod executor;
mod orchestrator;
mod rate_limiter;
mod request_tracker;
mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use catalog::CatalogFetcher;
pub use commits::{CommitAggregator, UNKNOWN_AUTHOR};
pub use concurrency_gate::ConcurrencyGate;
pub use error::{FetchError, TransportError};
pub use executor::RequestExecutor;
pub use orchestrator::FetchOrchestrator;
pub use rate_limiter::RateLimiter;
pub use request_tracker::{RequestStats, RequestTracker};
pub use transport::{ApiRequest, ApiResponse, DEFAULT_API_BASE_URL, HttpTransport, RateLimitInfo, Transport};
