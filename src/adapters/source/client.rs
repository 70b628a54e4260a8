//! HTTP record source
//!
//! Issues `GET <url>?_gender=..&_birthday_start=..&_quantity=..` and reads the
//! `data` array of the JSON response. Transient failures are retried with
//! exponential backoff.

use super::RecordSource;
use crate::config::{RetryConfig, SourceConfig};
use crate::domain::{RawRecord, Result, ShroudError, SourceError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP implementation of [`RecordSource`]
///
/// # Example
///
/// ```no_run
/// use shroud::adapters::source::{HttpRecordSource, RecordSource};
/// use shroud::config::SourceConfig;
///
/// # async fn example() -> shroud::domain::Result<()> {
/// let source = HttpRecordSource::new(SourceConfig::default())?;
/// let records = source.fetch(Some(10)).await?;
/// println!("fetched {}", records.len());
/// # Ok(())
/// # }
/// ```
pub struct HttpRecordSource {
    client: Client,
    config: SourceConfig,
}

impl HttpRecordSource {
    /// Create a new HTTP record source
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConnectionFailed`] if the HTTP client can't be built.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::ConnectionFailed(format!("failed to build client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Query parameters for one request
    fn query_params(&self, quantity: Option<usize>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref gender) = self.config.gender {
            params.push(("_gender", gender.clone()));
        }
        if let Some(ref start) = self.config.birthday_start {
            params.push(("_birthday_start", start.clone()));
        }
        if let Some(quantity) = quantity {
            params.push(("_quantity", quantity.to_string()));
        }
        params
    }

    /// Retry a request with exponential backoff
    ///
    /// Only transient failures (connection errors, timeouts, 5xx, 429) are
    /// retried; anything else is returned immediately.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, SourceError>>,
    {
        let max_retries = self.config.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries || !e.is_transient() {
                        return Err(ShroudError::Source(e));
                    }

                    let delay_ms = backoff_delay_ms(&self.config.retry, attempt);
                    crate::log_retry_attempt!(attempt, max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn fetch_once(&self, quantity: Option<usize>) -> std::result::Result<Value, SourceError> {
        let response = self
            .client
            .get(&self.config.url)
            .query(&self.query_params(quantity))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(e.to_string())
                } else {
                    SourceError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("body is not JSON: {e}")))
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, quantity: Option<usize>) -> Result<Vec<RawRecord>> {
        tracing::debug!(url = %self.config.url, quantity = ?quantity, "Fetching records");

        let body = self.retry_request(|| self.fetch_once(quantity)).await?;
        let records = parse_records(body)?;

        tracing::debug!(count = records.len(), "Received records");
        Ok(records)
    }

    fn endpoint(&self) -> &str {
        &self.config.url
    }
}

/// Delay before retry number `attempt` (1-based)
pub(crate) fn backoff_delay_ms(retry: &RetryConfig, attempt: usize) -> u64 {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    (delay.min(retry.max_delay_ms as f64)) as u64
}

fn status_error(status: StatusCode, body: String) -> SourceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        SourceError::RateLimitExceeded(body)
    } else if status.is_server_error() {
        SourceError::ServerError {
            status: status.as_u16(),
            message: body,
        }
    } else {
        SourceError::ClientError {
            status: status.as_u16(),
            message: body,
        }
    }
}

/// Extracts the `data` array; a body without one yields no records
fn parse_records(body: Value) -> std::result::Result<Vec<RawRecord>, SourceError> {
    let Value::Object(mut map) = body else {
        return Err(SourceError::InvalidResponse(
            "response body is not a JSON object".to_string(),
        ));
    };

    match map.remove("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                RawRecord::from_value(item)
                    .map_err(|e| SourceError::InvalidResponse(format!("data[{i}]: {e}")))
            })
            .collect(),
        Some(_) => Err(SourceError::InvalidResponse(
            "'data' is not an array".to_string(),
        )),
    }
}
