use super::transport::RateLimitInfo;
use thiserror::Error;

/// Failure of a single outbound call, as reported by a [`Transport`](super::Transport).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, TLS, timeout or body read failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server responded with HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        /// Quota information carried by the error response, if any
        rate_limit: Option<RateLimitInfo>,
    },

    /// The body was not valid JSON or did not have the expected shape
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// Quota information attached to the failed response, if any.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimitInfo> {
        match self {
            Self::Status { rate_limit, .. } => *rate_limit,
            Self::Http(_) | Self::Decode(_) => None,
        }
    }
}

/// Errors surfaced by the fetch layer.
///
/// A commit history that cannot be fetched is intentionally absent from this
/// list: it is recovered inside [`CommitAggregator`](super::CommitAggregator)
/// and never reaches the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A single outbound call failed. Never retried automatically.
    #[error("request to '{endpoint}' failed: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    /// The repository listing could not be retrieved, so the run cannot proceed.
    #[error("repository listing is unavailable: {source}")]
    CatalogUnavailable {
        #[source]
        source: Box<Self>,
    },

    /// Limits or capacities that cannot be honored.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl FetchError {
    pub(crate) fn request_failed(endpoint: impl Into<String>, source: impl Into<TransportError>) -> Self {
        Self::RequestFailed {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(message.into())
    }
}
