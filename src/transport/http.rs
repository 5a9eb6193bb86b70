//! HTTP transport: POST the run request, read the SSE response.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use super::sse::decode_events;
use super::{EventSource, EventStream};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::RunAgentInput;
use crate::util::RetryPolicy;

/// Event source backed by an AG-UI HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
    open_timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl HttpEventSource {
    /// Build a source from `config`. Fails when no endpoint is configured.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.require_endpoint()?.to_string();
        let mut client = reqwest::Client::builder().pool_max_idle_per_host(10);
        if let Some(timeout) = config.request_timeout() {
            client = client.connect_timeout(timeout);
        }
        let client = client.build()?;

        Ok(Self {
            client,
            endpoint,
            headers: request_headers(config)?,
            open_timeout: config.request_timeout(),
            retry: RetryPolicy::default().with_max_attempts(config.max_open_attempts),
        })
    }

    /// Replace the retry schedule used when opening a stream.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn open_once(&self, input: &RunAgentInput) -> Result<reqwest::Response> {
        let send = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(input)
            .send();

        let response = match self.open_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| ClientError::Timeout(millis(limit)))??,
            None => send.await?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }
        Ok(response)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn open(&self, input: RunAgentInput) -> Result<EventStream> {
        tracing::debug!(
            endpoint = %self.endpoint,
            thread_id = %input.thread_id,
            run_id = %input.run_id,
            messages = input.messages.len(),
            "opening run stream"
        );
        let response = self.retry.execute(|| self.open_once(&input)).await?;
        Ok(decode_events(response.bytes_stream()).boxed())
    }
}

fn request_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    if let Some(key) = config.api_key.as_deref() {
        let value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ClientError::Configuration("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, value);
    }
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::Configuration(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::Configuration(format!("invalid value for header '{name}'")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Map a non-success status to an error.
pub fn status_to_error(status: u16, body: &str) -> ClientError {
    match status {
        401 | 403 => ClientError::Authentication(body.to_string()),
        429 => ClientError::RateLimited,
        _ => ClientError::Http {
            status,
            message: body.to_string(),
        },
    }
}
