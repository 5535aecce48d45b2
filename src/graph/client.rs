//! HTTP request executor for the Microsoft Graph API.
//!
//! One logical operation per call: bearer auth, JSON body, OData query
//! parameters, and a bounded exponential-backoff retry loop for server
//! and transport failures. Everything else is classified immediately.

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::GraphError;

/// Microsoft Graph v1.0 base URL.
pub const BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Maximum retry attempts for 5xx and transport failures (4 total attempts).
const MAX_RETRIES: u32 = 3;

/// First backoff delay; doubles on every retry.
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Per-attempt request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback when a 429 response carries no usable Retry-After header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for Graph API operations on behalf of one user.
///
/// Holds the user's access token and applies it as a bearer header on
/// every request. Retries are synchronous: the calling operation waits
/// through the backoff sleeps until the executor returns or gives up.
pub struct GraphClient {
    access_token: String,
    http_client: Client,
    base_url: String,
    retry_delay: Duration,
}

impl GraphClient {
    /// Creates a client against the production Graph base URL.
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, BASE_URL.to_string())
    }

    /// Creates a client with a custom base URL (for testing with a mock
    /// server).
    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            access_token,
            http_client,
            base_url,
            retry_delay: INITIAL_RETRY_DELAY,
        }
    }

    /// Overrides the initial backoff delay (tests use a short delay so
    /// retry sequences finish quickly).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Issues one logical request and classifies the outcome.
    ///
    /// 401 and 429 fail immediately. 5xx and transport errors are retried
    /// with delays `retry_delay * 2^attempt` up to [`MAX_RETRIES`]; other
    /// 4xx fail with the provider's error message when parseable. A 204
    /// or empty 2xx body yields an empty JSON object.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(String, String)]>,
    ) -> Result<Value, GraphError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            debug!(method = %method, path, attempt, "sending Graph request");

            let mut request = self
                .http_client
                .request(method.clone(), &url)
                .bearer_auth(&self.access_token);
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(query) = query {
                request = request.query(query);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(status = %status, path, "Graph response received");

                    if status == StatusCode::UNAUTHORIZED {
                        return Err(GraphError::TokenExpired);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                        return Err(GraphError::RateLimited { retry_after });
                    }

                    if status.is_server_error() {
                        let text = response.text().await.unwrap_or_default();
                        if attempt < MAX_RETRIES {
                            self.backoff(attempt, &format!("server error {}", status))
                                .await;
                            attempt += 1;
                            continue;
                        }
                        return Err(GraphError::Server(format!(
                            "status {} after {} retries: {}",
                            status, MAX_RETRIES, text
                        )));
                    }

                    if status.is_client_error() {
                        let text = response.text().await.unwrap_or_default();
                        let message = extract_error_message(&text);
                        return Err(GraphError::Api {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    if status == StatusCode::NO_CONTENT {
                        return Ok(json!({}));
                    }

                    let text = response
                        .text()
                        .await
                        .map_err(|e| GraphError::Network(e.to_string()))?;
                    if text.is_empty() {
                        return Ok(json!({}));
                    }
                    return serde_json::from_str(&text).map_err(|e| GraphError::Api {
                        status: status.as_u16(),
                        message: format!("response body is not valid JSON: {}", e),
                    });
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        self.backoff(attempt, &format!("network error: {}", e)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(GraphError::Network(format!(
                        "{} after {} retries",
                        e, MAX_RETRIES
                    )));
                }
            }
        }
    }

    /// Sleeps for `retry_delay * 2^attempt` before the next attempt.
    async fn backoff(&self, attempt: u32, reason: &str) {
        let delay = self.retry_delay * 2u32.pow(attempt);
        warn!(
            attempt = attempt + 1,
            max_retries = MAX_RETRIES,
            delay_ms = delay.as_millis() as u64,
            "{}, retrying",
            reason
        );
        tokio::time::sleep(delay).await;
    }
}

/// Pulls the `error.message` field out of a Graph error body, falling back
/// to the raw response text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_structured_error_message() {
        let body = r#"{"error": {"code": "ErrorItemNotFound", "message": "Resource not found"}}"#;
        assert_eq!(extract_error_message(body), "Resource not found");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_raw_text() {
        assert_eq!(extract_error_message("Not found"), "Not found");
        assert_eq!(extract_error_message(r#"{"error": "flat"}"#), r#"{"error": "flat"}"#);
    }
}
