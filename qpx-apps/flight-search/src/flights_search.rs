//!  QPX Flight Search
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # QPX Express Search Client
//!
//! Effectful (time, network) operations for QPX Express search.
//!
//! Every public call comes in two forms: an `async fn` that yields during the
//! rate-limit delay and the network wait, and a `*_blocking` twin that parks
//! the calling thread. Both run the same dispatch routine; only the pacing
//! differs.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use qpx_request_pacing::RateLimiter;
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::error::{ApiError, SearchError, TransportError, ValidationError};
use crate::flights_query_builder::SearchRequest;
use crate::flights_results_parser::SearchResult;

pub const QPX_SEARCH_URL: &str = "https://www.googleapis.com/qpxExpress/v1/trips/search";

const HTTP_OK: u16 = 200;

/// Connection settings for a [`QpxClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent as the `key` query parameter. Never logged.
    pub api_key: String,
    pub endpoint: String,
    /// 0 disables rate limiting.
    pub queries_per_day: u64,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: QPX_SEARCH_URL.to_string(),
            queries_per_day: 0,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Performs exactly one HTTP exchange per call, without retries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<HttpReply, TransportError>;
}

/// `wreq`-backed transport. The client and its connection pool are built on
/// first use and shared by every clone of the owning [`QpxClient`].
#[derive(Default)]
pub struct WreqTransport {
    timeout: Option<Duration>,
    client: OnceCell<wreq::Client>,
}

impl WreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            client: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&wreq::Client, TransportError> {
        self.client.get_or_try_init(|| {
            tracing::debug!("[transport] Building HTTP client (timeout: {:?})", self.timeout);
            let mut builder = wreq::Client::builder();
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout).connect_timeout(timeout);
            }
            builder.build().map_err(TransportError::ClientBuild)
        })
    }
}

#[async_trait]
impl HttpTransport for WreqTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<HttpReply, TransportError> {
        let client = self.client()?;
        let request = match method {
            Method::Get => client.get(url),
            Method::Post => client.post(url),
        };
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(
            "[transport] HTTP Status: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );

        let body = response.text().await?;
        Ok(HttpReply {
            status: status.as_u16(),
            body,
        })
    }
}

/// Anything that can be sent as a search body.
///
/// A [`SearchRequest`] is shaped by [`SearchRequest::to_json`]; a raw
/// [`Value`] is forwarded as is.
pub trait RequestBody {
    fn json_body(&self) -> Cow<'_, Value>;
}

impl RequestBody for SearchRequest {
    fn json_body(&self) -> Cow<'_, Value> {
        Cow::Owned(self.to_json())
    }
}

impl RequestBody for Value {
    fn json_body(&self) -> Cow<'_, Value> {
        Cow::Borrowed(self)
    }
}

/// Drives every `*_blocking` call in the process. Never dropped, so clients
/// may be released from any context.
static BLOCKING_RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// How the dispatch routine waits out the rate-limit delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pacing {
    Suspend,
    Block,
}

pub struct QpxClient<T = WreqTransport> {
    transport: Arc<T>,
    api_key: Arc<str>,
    endpoint: Arc<str>,
    rate_limiter: RateLimiter,
}

impl<T> Clone for QpxClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            api_key: Arc::clone(&self.api_key),
            endpoint: Arc::clone(&self.endpoint),
            rate_limiter: self.rate_limiter.clone(),
        }
    }
}

impl<T> std::fmt::Debug for QpxClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QpxClient")
            .field("endpoint", &self.endpoint)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl QpxClient<WreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = WreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: HttpTransport> QpxClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            api_key: config.api_key.into(),
            endpoint: config.endpoint.into(),
            rate_limiter: RateLimiter::with_queries_per_day(config.queries_per_day),
        }
    }

    /// Limiter shared by this client and its clones.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn set_queries_per_day(&self, queries_per_day: i64) -> Result<(), ValidationError> {
        self.rate_limiter.set_queries_per_day(queries_per_day)?;
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn search<R>(&self, request: &R) -> Result<SearchResult, SearchError>
    where
        R: RequestBody + Sync + ?Sized,
    {
        self.search_with(request, Pacing::Suspend).await
    }

    pub fn search_blocking<R>(&self, request: &R) -> Result<SearchResult, SearchError>
    where
        R: RequestBody + Sync + ?Sized,
    {
        self.blocking_runtime()?
            .block_on(self.search_with(request, Pacing::Block))
    }

    /// The response document exactly as the API returned it.
    pub async fn search_raw<R>(&self, request: &R) -> Result<Value, SearchError>
    where
        R: RequestBody + Sync + ?Sized,
    {
        self.search_raw_with(request, Pacing::Suspend).await
    }

    pub fn search_raw_blocking<R>(&self, request: &R) -> Result<Value, SearchError>
    where
        R: RequestBody + Sync + ?Sized,
    {
        self.blocking_runtime()?
            .block_on(self.search_raw_with(request, Pacing::Block))
    }

    /// GET `url` with the API key appended and return the decoded JSON body.
    pub async fn get_json(&self, url: &str) -> Result<Value, SearchError> {
        self.dispatch(Method::Get, url, None, Pacing::Suspend).await
    }

    pub fn get_json_blocking(&self, url: &str) -> Result<Value, SearchError> {
        self.blocking_runtime()?
            .block_on(self.dispatch(Method::Get, url, None, Pacing::Block))
    }

    async fn search_with<R>(&self, request: &R, pacing: Pacing) -> Result<SearchResult, SearchError>
    where
        R: RequestBody + Sync + ?Sized,
    {
        let overall_start = Instant::now();
        let document = self.search_raw_with(request, pacing).await?;

        let parse_start = Instant::now();
        let result = SearchResult::from_api_json(&document)?;
        tracing::debug!(
            "Parsed {} trips in {:?}",
            result.trips.len(),
            parse_start.elapsed()
        );
        tracing::info!("Total search time: {:?}", overall_start.elapsed());
        Ok(result)
    }

    async fn search_raw_with<R>(&self, request: &R, pacing: Pacing) -> Result<Value, SearchError>
    where
        R: RequestBody + Sync + ?Sized,
    {
        let body = request.json_body();
        self.dispatch(Method::Post, &self.endpoint, Some(body.as_ref()), pacing)
            .await
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        pacing: Pacing,
    ) -> Result<Value, SearchError> {
        let queue_start = Instant::now();
        match pacing {
            Pacing::Suspend => self.rate_limiter.wait().await,
            Pacing::Block => self.rate_limiter.wait_blocking(),
        }
        tracing::trace!("[dispatch] Rate limit wait: {:?}", queue_start.elapsed());

        let keyed_url = append_api_key(url, &self.api_key);
        let http_start = Instant::now();
        tracing::trace!("[dispatch] Starting {:?} request to: {}", method, url);
        let reply = self.transport.send(method, &keyed_url, body).await?;
        tracing::debug!(
            "[dispatch] {:?} {} -> {} in {:?}, {} KB",
            method,
            url,
            reply.status,
            http_start.elapsed(),
            reply.body.len() / 1024
        );

        interpret_reply(reply)
    }

    fn blocking_runtime(&self) -> Result<&'static Runtime, TransportError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(TransportError::BlockingInAsyncContext);
        }
        let runtime = BLOCKING_RUNTIME.get_or_try_init(|| {
            tracing::debug!("[dispatch] Starting the blocking runtime");
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("qpx-blocking")
                .enable_all()
                .build()
        })?;
        Ok(runtime)
    }
}

fn append_api_key(url: &str, api_key: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", url, separator, urlencoding::encode(api_key))
}

/// Success bodies are returned unmodified; anything else becomes an [`ApiError`].
fn interpret_reply(reply: HttpReply) -> Result<Value, SearchError> {
    let HttpReply { status, body } = reply;

    if status != HTTP_OK {
        let envelope = serde_json::from_str(&body).unwrap_or(Value::Null);
        let err = ApiError::from_envelope(status, &envelope);
        tracing::warn!("API returned HTTP {}: {}", status, err);
        return Err(err.into());
    }

    serde_json::from_str(&body).map_err(|source| {
        let preview = body.chars().take(300).collect::<String>();
        tracing::error!("Response body is not JSON. Preview: {}", preview);
        TransportError::MalformedJson { status, source }.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_api_key() {
        assert_eq!(
            append_api_key(QPX_SEARCH_URL, "abc"),
            "https://www.googleapis.com/qpxExpress/v1/trips/search?key=abc"
        );
        assert_eq!(
            append_api_key("https://example.com/x?alt=json", "a b&c"),
            "https://example.com/x?alt=json&key=a%20b%26c"
        );
    }

    #[test]
    fn test_interpret_success_passthrough() {
        let body = r#"{"kind": "qpxExpress#tripsSearch", "trips": {"requestId": "x"}}"#;
        let value = interpret_reply(HttpReply {
            status: 200,
            body: body.to_string(),
        })
        .unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(body).unwrap());
    }

    #[test]
    fn test_interpret_error_envelope() {
        let body = json!({
            "error": {"code": 404, "message": "Unknown Endpoint", "errors": [{"reason": "NotFound"}]}
        })
        .to_string();
        let err = interpret_reply(HttpReply { status: 404, body }).unwrap_err();
        match err {
            SearchError::Api(api) => {
                assert_eq!(api, ApiError::new(404, "Unknown Endpoint", "NotFound"));
                assert_eq!(api.to_string(), "404: Unknown Endpoint (NotFound)");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[test]
    fn test_interpret_error_without_envelope() {
        let err = interpret_reply(HttpReply {
            status: 502,
            body: "<html>Bad Gateway</html>".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, SearchError::Api(ApiError { code: 502, .. })));
    }

    #[test]
    fn test_interpret_malformed_json() {
        let err = interpret_reply(HttpReply {
            status: 200,
            body: "{not json".to_string(),
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Transport(TransportError::MalformedJson { status: 200, .. })
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("secret");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.endpoint, QPX_SEARCH_URL);
        assert_eq!(config.queries_per_day, 0);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = QpxClient::new(ClientConfig::new("super-secret-key"));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("qpxExpress"));
    }

    #[test]
    fn test_clones_share_quota() {
        let client = QpxClient::new(ClientConfig::new("k"));
        let clone = client.clone();
        client.set_queries_per_day(50).unwrap();
        assert_eq!(clone.rate_limiter().queries_per_day(), 50);
        assert!(matches!(
            clone.set_queries_per_day(-1),
            Err(ValidationError::RateLimit(_))
        ));
        assert_eq!(client.rate_limiter().queries_per_day(), 50);
    }
}
