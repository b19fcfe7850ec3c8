use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::header::USER_AGENT;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::application::error::MockupError;
use crate::config::{ApiSettings, TransportSettings};

use super::rate_limit::RequestBudget;
use super::retry::{RetryPolicy, parse_retry_hint, retry_after_header};
use super::wire::ErrorBody;

const TARGET: &str = "infra::renderer::transport";
const STORE_HEADER: &str = "X-PF-Store-Id";
const CLIENT_USER_AGENT: &str = concat!("mockup-engine/", env!("CARGO_PKG_VERSION"));
const METRIC_REQUEST_MS: &str = "mockup_transport_request_ms";
const METRIC_RETRY: &str = "mockup_transport_retry_total";

/// Secret and tenant required by every outbound call.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    store_id: u64,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("store_id", &self.store_id)
            .finish()
    }
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, store_id: u64) -> Result<Self, MockupError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(MockupError::configuration("render API key is empty"));
        }
        if store_id == 0 {
            return Err(MockupError::configuration("render store id must be non-zero"));
        }
        Ok(Self { api_key, store_id })
    }

    /// Both values must be configured; there is no anonymous mode.
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, MockupError> {
        let api_key = settings.api_key.as_deref().ok_or_else(|| {
            MockupError::configuration(
                "render API key is not configured (api.api_key / MOCKUP_API_KEY)",
            )
        })?;
        let store_id = settings.store_id.ok_or_else(|| {
            MockupError::configuration(
                "render store id is not configured (api.store_id / MOCKUP_STORE_ID)",
            )
        })?;
        Self::new(api_key, store_id)
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub window: Duration,
    pub max_requests: u32,
    pub max_concurrency: u32,
    pub min_spacing: Duration,
    pub retry: RetryPolicy,
}

impl TransportConfig {
    pub fn from_settings(api: &ApiSettings, transport: &TransportSettings) -> Self {
        Self {
            base_url: api.base_url.clone(),
            request_timeout: api.request_timeout,
            window: transport.window,
            max_requests: transport.max_requests.get(),
            max_concurrency: transport.max_concurrency.get(),
            min_spacing: transport.min_spacing,
            retry: RetryPolicy::from(transport),
        }
    }
}

/// Shared HTTP channel to the rendering API.
///
/// Every call goes through one [`RequestBudget`]; rate-limited and unreachable
/// attempts are retried per [`RetryPolicy`]. Timeouts are retried only for
/// idempotent methods.
#[derive(Debug, Clone)]
pub struct RateLimitedTransport {
    client: Client,
    base_url: Url,
    credentials: ApiCredentials,
    budget: Arc<RequestBudget>,
    retry: RetryPolicy,
}

enum Attempt {
    Done(String),
    Retry { delay: Duration, reason: &'static str },
}

impl RateLimitedTransport {
    pub fn new(config: TransportConfig, credentials: ApiCredentials) -> Result<Self, MockupError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                MockupError::configuration(format!("failed to build HTTP client: {err}"))
            })?;
        let budget = RequestBudget::new(
            config.window,
            config.max_requests,
            config.max_concurrency,
            config.min_spacing,
        );

        Ok(Self {
            client,
            base_url: normalize_base(config.base_url),
            credentials,
            budget: Arc::new(budget),
            retry: config.retry,
        })
    }

    pub fn endpoint(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Url, MockupError> {
        let mut url = self.base_url.join(path).map_err(|err| {
            MockupError::configuration(format!("invalid endpoint `{path}` for `{operation}`: {err}"))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<T, MockupError> {
        let raw = self.execute(operation, Method::GET, url, None).await?;
        decode(operation, &raw)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
        body: &B,
    ) -> Result<T, MockupError> {
        let payload = serde_json::to_value(body)
            .map_err(|err| MockupError::decode(operation, format!("encode request: {err}")))?;
        let raw = self
            .execute(operation, Method::POST, url, Some(payload))
            .await?;
        decode(operation, &raw)
    }

    async fn execute(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<String, MockupError> {
        let mut attempt = 1;
        loop {
            match self
                .attempt(operation, &method, &url, body.as_ref(), attempt)
                .await?
            {
                Attempt::Done(raw) => return Ok(raw),
                Attempt::Retry { delay, reason } => {
                    counter!(METRIC_RETRY, "op" => operation, "reason" => reason).increment(1);
                    warn!(
                        target = TARGET,
                        op = operation,
                        result = "retry",
                        reason,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Render API request will be retried"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        operation: &'static str,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
        attempt: u32,
    ) -> Result<Attempt, MockupError> {
        let _permit = self.budget.acquire().await?;
        let started_at = Instant::now();

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&self.credentials.api_key)
            .header(STORE_HEADER, self.credentials.store_id.to_string())
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await;
        let elapsed = started_at.elapsed();
        histogram!(METRIC_REQUEST_MS, "op" => operation).record(elapsed.as_secs_f64() * 1000.0);

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                // A timed-out POST may already have created the task server-side.
                let retryable = err.is_connect() || (err.is_timeout() && method.is_idempotent());
                warn!(
                    target = TARGET,
                    op = operation,
                    method = %method,
                    endpoint = url.path(),
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    result = "transport_error",
                    error = %err,
                    "Render API request failed before a response"
                );
                if retryable && self.retry.should_retry(attempt) {
                    return Ok(Attempt::Retry {
                        delay: self.retry.backoff(attempt),
                        reason: "transport",
                    });
                }
                return Err(MockupError::transport(operation, err.to_string()));
            }
        };

        let status = response.status();
        debug!(
            target = TARGET,
            op = operation,
            method = %method,
            endpoint = url.path(),
            status = status.as_u16(),
            attempt,
            elapsed_ms = elapsed.as_millis() as u64,
            "Render API responded"
        );

        let header_hint = retry_after_header(response.headers());
        let raw = response
            .text()
            .await
            .map_err(|err| MockupError::transport(operation, format!("read body: {err}")))?;

        if status.is_success() {
            return Ok(Attempt::Done(raw));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let hint = parse_retry_hint(&raw).or(header_hint);
            if self.retry.should_retry(attempt) {
                return Ok(Attempt::Retry {
                    delay: self.retry.delay_for(attempt, hint),
                    reason: "rate_limited",
                });
            }
            return Err(MockupError::RateLimited {
                operation,
                attempts: attempt,
                message: ErrorBody::parse(&raw).message_or("too many requests"),
            });
        }

        let error = ErrorBody::parse(&raw);
        Err(MockupError::Api {
            operation,
            status: status.as_u16(),
            code: error.code,
            message: error.message_or(status.canonical_reason().unwrap_or("request failed")),
        })
    }
}

fn decode<T: DeserializeOwned>(operation: &'static str, raw: &str) -> Result<T, MockupError> {
    serde_json::from_str(raw).map_err(|err| MockupError::decode(operation, err.to_string()))
}

/// `Url::join` drops the last segment unless the base ends with `/`.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}
