//! Wire-level access to the hosting API.
//!
//! [`Transport`] is the seam between the fetch layer and the network: the
//! executor only ever talks to a transport, which lets tests substitute a
//! scripted implementation. [`HttpTransport`] is the real `reqwest`-backed one.

use super::error::TransportError;
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

/// Default base URL of the GitHub REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "repo-pulse";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// One outbound API call, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub params: Vec<(&'static str, String)>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    /// Look up the value of a query parameter.
    #[must_use]
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// A decoded response body plus the quota the server reported alongside it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: serde_json::Value,
    pub rate_limit: Option<RateLimitInfo>,
}

/// Issues a single API call and decodes its JSON body.
///
/// Implementations must not retry and must not apply any throttling of their own;
/// both are the responsibility of [`RequestExecutor`](super::RequestExecutor).
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: &ApiRequest) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

/// `reqwest`-backed transport for GitHub-compatible APIs.
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a new transport with an optional access token.
    ///
    /// The token is sent as a bearer credential and marked sensitive so that it
    /// never shows up in `Debug` output of the underlying client.
    pub fn new(token: Option<&str>, base_url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL for this transport
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let resp = self
            .client
            .request(request.method.clone(), self.endpoint_url(&request.endpoint))
            .query(&request.params)
            .send()
            .await?;

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status { status, rate_limit });
        }

        let bytes = resp.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;

        Ok(ApiResponse { body, rate_limit })
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
