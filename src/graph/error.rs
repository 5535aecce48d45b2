//! Error kinds for Graph API operations.
//!
//! Callers pattern-match on the variant to decide user-facing behavior:
//! `TokenExpired` prompts re-authentication, `RateLimited` carries the
//! provider's retry-after hint, and `InvalidRequest` means no request was
//! ever sent.

use thiserror::Error;

/// Outcome classification for a Graph API operation.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The access token was rejected (HTTP 401). Never retried.
    #[error("access token expired or invalid")]
    TokenExpired,

    /// The provider throttled us (HTTP 429). Never retried internally;
    /// `retry_after` is the advertised wait in seconds.
    #[error("rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// 5xx responses persisted through every retry attempt.
    #[error("server error after retries: {0}")]
    Server(String),

    /// Transport failures (timeout, connectivity) persisted through every
    /// retry attempt.
    #[error("network error after retries: {0}")]
    Network(String),

    /// A non-retryable 4xx response, with the provider's structured error
    /// message when one could be parsed.
    #[error("Graph API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A local precondition failed; no request was sent.
    #[error("{0}")]
    InvalidRequest(String),
}
