//! Encrypted in-memory storage for OAuth tokens and PKCE verifiers.
//!
//! Token records are serialized to JSON and encrypted with AES-256-GCM
//! before they ever touch the map, so a process memory dump does not leak
//! bearer tokens in the clear. PKCE code verifiers are held only for the
//! duration of a login flow and are consumed on first retrieval.
//!
//! Storage is memory-resident: records live for the process lifetime and
//! are lost on restart, at which point users re-authenticate.
//! The [`TokenStore`] owns both maps exclusively; swapping in a durable
//! backing store later only needs to preserve this module's operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod encryption;
mod store;

pub use store::TokenStore;

// Re-export encryption primitives for tests/utilities
pub use encryption::{decrypt, derive_key, encrypt};

/// Token fields as granted by the identity provider.
///
/// This is what a login or refresh produces; the store stamps it with a
/// storage timestamp when it is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// OAuth access token (used for Graph API requests)
    pub access_token: String,

    /// OAuth refresh token, when the provider issued one
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds, relative to storage time
    pub expires_in: i64,

    /// Space-separated scopes actually granted
    pub scope: String,

    /// Token type, normally "Bearer"
    pub token_type: String,
}

/// A stored token record: the grant plus the time it was stored.
///
/// Expiry is always judged against `stored_at`, never against a
/// caller-supplied clock value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub scope: String,
    pub token_type: String,

    /// When the record was written to the store (UTC)
    pub stored_at: DateTime<Utc>,
}
