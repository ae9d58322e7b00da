//! Request sending with retry: exponential backoff for transient
//! network failures, `Retry-After`-aware handling of 429 responses.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, SystemTime};

use crate::config::NetworkConfig;
use crate::error::{KomittoError, Result};
use crate::ui::Spinner;

const MIN_RETRY_DELAY_MS: u64 = 100;

/// Retry knobs snapshotted from [`NetworkConfig`] into each client.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl From<&NetworkConfig> for RetryPolicy {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            max_retries: network.max_retries,
            retry_delay_ms: network.retry_delay_ms,
            max_retry_delay_ms: network.max_retry_delay_ms,
        }
    }
}

/// Only connection failures are worth retrying; everything else either
/// reached the backend or will fail the same way again.
fn is_retryable_error(error: &KomittoError) -> bool {
    match error {
        KomittoError::Llm(msg) => msg.to_lowercase().contains("connection failed"),
        _ => false,
    }
}

/// Parses a `Retry-After` header value: either seconds (`120`) or an
/// HTTP date. Dates in the past yield 0.
fn parse_retry_after(value: &str) -> Option<u64> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }

    if let Ok(date) = httpdate::parse_http_date(value) {
        let now = SystemTime::now();
        return Some(date.duration_since(now).map(|d| d.as_secs()).unwrap_or(0));
    }

    None
}

/// One send attempt; maps transport errors into provider-tagged
/// messages so the retry classifier can act on them.
async fn try_send_request<Req: Serialize>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
) -> Result<reqwest::Response> {
    let mut req = client
        .post(endpoint)
        .header("Content-Type", "application/json");

    for (key, value) in headers {
        req = req.header(*key, *value);
    }

    tracing::debug!("Sending request to: {}", endpoint);

    req.json(request_body).send().await.map_err(|e| {
        if e.is_timeout() {
            KomittoError::Llm(format!("{} API request timed out: {}", provider_name, e))
        } else if e.is_connect() {
            KomittoError::Llm(format!("{} API connection failed: {}", provider_name, e))
        } else {
            KomittoError::Network(e)
        }
    })
}

/// Classifies a non-success response into the error taxonomy.
fn status_error(status: u16, provider_name: &str, body: String) -> KomittoError {
    match status {
        401 | 403 => KomittoError::Authentication(format!(
            "{} rejected the API key ({}): {}",
            provider_name, status, body
        )),
        _ => KomittoError::LlmApi {
            status,
            message: format!("{}: {}", provider_name, body),
        },
    }
}

/// Sends an LLM request and deserializes the successful response,
/// retrying connection failures and 429s within the policy.
pub async fn send_llm_request<Req, Resp>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
    spinner: Option<&Spinner>,
    policy: RetryPolicy,
) -> Result<Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let response = send_with_retry(
        client,
        endpoint,
        headers,
        request_body,
        provider_name,
        spinner,
        policy,
    )
    .await?;

    let response_text = response.text().await?;
    tracing::debug!("{} API response body: {}", provider_name, response_text);

    serde_json::from_str(&response_text).map_err(|e| {
        KomittoError::Llm(format!(
            "Failed to parse {} response: {}. Raw response: {}",
            provider_name, e, response_text
        ))
    })
}

/// Sends an LLM request and hands back the raw response for SSE
/// consumption. Status handling and retries are identical to
/// [`send_llm_request`].
pub async fn send_llm_request_streaming<Req: Serialize>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
    policy: RetryPolicy,
) -> Result<reqwest::Response> {
    send_with_retry(
        client,
        endpoint,
        headers,
        request_body,
        provider_name,
        None,
        policy,
    )
    .await
}

async fn send_with_retry<Req: Serialize>(
    client: &Client,
    endpoint: &str,
    headers: &[(&str, &str)],
    request_body: &Req,
    provider_name: &str,
    spinner: Option<&Spinner>,
    policy: RetryPolicy,
) -> Result<reqwest::Response> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let response =
            match try_send_request(client, endpoint, headers, request_body, provider_name).await {
                Ok(resp) => resp,
                Err(e) => {
                    if !is_retryable_error(&e) || attempt > policy.max_retries {
                        return Err(e);
                    }

                    if let Some(s) = spinner {
                        s.append_suffix(&rust_i18n::t!(
                            "provider.retrying_suffix",
                            attempt = attempt,
                            max = policy.max_retries
                        ));
                    }

                    let delay = exponential_backoff(attempt, policy);
                    tracing::debug!(
                        "{} API network error (attempt {}/{}): {}. Retrying in {:.1}s...",
                        provider_name,
                        attempt,
                        policy.max_retries + 1,
                        e,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<body read error: {}>", e));

            if attempt > policy.max_retries {
                return Err(status_error(429, provider_name, body));
            }

            if let Some(s) = spinner {
                s.append_suffix(&rust_i18n::t!(
                    "provider.retrying_suffix",
                    attempt = attempt,
                    max = policy.max_retries
                ));
            }

            let delay = match retry_after {
                Some(secs) => {
                    let retry_after_ms = secs.saturating_mul(1000);
                    if retry_after_ms > policy.max_retry_delay_ms {
                        return Err(KomittoError::Llm(format!(
                            "{} rate limited; server asked to wait {}s, beyond the configured limit",
                            provider_name, secs
                        )));
                    }
                    Duration::from_secs(secs)
                }
                None => exponential_backoff(attempt, policy),
            };

            tracing::debug!(
                "{} API rate limited (attempt {}/{}). Retrying in {:.1}s...",
                provider_name,
                attempt,
                policy.max_retries + 1,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::debug!("{} API error response body: {}", provider_name, body);
            return Err(status_error(status.as_u16(), provider_name, body));
        }

        if attempt > 1 {
            tracing::debug!(
                "{} API request succeeded after {} attempts",
                provider_name,
                attempt
            );
        }

        return Ok(response);
    }
}

fn exponential_backoff(attempt: usize, policy: RetryPolicy) -> Duration {
    let multiplier = 1u64.checked_shl((attempt - 1) as u32).unwrap_or(u64::MAX);
    let delay_ms = policy
        .retry_delay_ms
        .saturating_mul(multiplier)
        .min(policy.max_retry_delay_ms)
        .max(MIN_RETRY_DELAY_MS);
    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 60_000,
        }
    }

    #[test]
    fn test_is_retryable_connection_failed() {
        let err = KomittoError::Llm("OpenAI API connection failed: dns error".to_string());
        assert!(is_retryable_error(&err));
    }

    #[test]
    fn test_is_retryable_mixed_case() {
        let err = KomittoError::Llm("Connection Failed".to_string());
        assert!(is_retryable_error(&err));
    }

    #[test]
    fn test_not_retryable() {
        assert!(!is_retryable_error(&KomittoError::Llm(
            "API error (500)".to_string()
        )));
        assert!(!is_retryable_error(&KomittoError::Config(
            "missing key".to_string()
        )));
        assert!(!is_retryable_error(&KomittoError::Authentication(
            "bad key".to_string()
        )));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(120));
        assert_eq!(parse_retry_after("0"), Some(0));
    }

    #[test]
    fn test_parse_retry_after_past_date_is_zero() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(0));
    }

    #[test]
    fn test_parse_retry_after_garbage() {
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let p = policy();
        assert_eq!(exponential_backoff(1, p), Duration::from_millis(1000));
        assert_eq!(exponential_backoff(2, p), Duration::from_millis(2000));
        assert_eq!(exponential_backoff(3, p), Duration::from_millis(4000));
        assert_eq!(exponential_backoff(10, p), Duration::from_millis(60_000));
    }

    #[test]
    fn test_status_error_auth_variants() {
        assert!(matches!(
            status_error(401, "OpenAI", "nope".into()),
            KomittoError::Authentication(_)
        ));
        assert!(matches!(
            status_error(403, "Gemini", "nope".into()),
            KomittoError::Authentication(_)
        ));
        assert!(matches!(
            status_error(500, "OpenAI", "boom".into()),
            KomittoError::LlmApi { status: 500, .. }
        ));
    }
}
