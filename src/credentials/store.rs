//! In-memory encrypted token store.
//!
//! Holds two maps: user id → encrypted token record, and OAuth state →
//! PKCE code verifier. Entries are keyed by independent identifiers, so
//! there is no cross-key locking; concurrent writes to the same user id
//! are last-writer-wins.

use super::{encryption, TokenGrant, TokenRecord};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// An encrypted record at rest: base64 ciphertext plus its nonce.
#[derive(Clone, Debug)]
struct SealedRecord {
    ciphertext: String,
    nonce: String,
}

/// Encrypted in-memory storage for per-user OAuth tokens and in-flight
/// PKCE code verifiers.
///
/// # Security
/// - Token records are AES-256-GCM encrypted before insertion
/// - The cipher key is derived from the configured secret and held in
///   memory only
/// - A record that fails to decrypt is treated as corrupt and evicted;
///   callers observe it as absent, never as an error
/// - Code verifiers are single-use: retrieval removes the entry, so a
///   replayed OAuth state cannot complete a second code exchange
pub struct TokenStore {
    encryption_key: [u8; 32],
    tokens: Mutex<HashMap<String, SealedRecord>>,
    verifiers: Mutex<HashMap<String, String>>,
}

impl TokenStore {
    /// Creates a store whose cipher key is derived from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encryption_key: encryption::derive_key(secret),
            tokens: Mutex::new(HashMap::new()),
            verifiers: Mutex::new(HashMap::new()),
        }
    }

    /// Stores a PKCE code verifier for the login flow identified by `state`.
    ///
    /// Overwrites any previous verifier stored under the same state.
    pub fn store_code_verifier(&self, state: &str, verifier: &str) {
        let mut verifiers = self.verifiers.lock().unwrap();
        verifiers.insert(state.to_string(), verifier.to_string());
    }

    /// Returns and removes the code verifier stored under `state`.
    ///
    /// Single-use: the entry is gone after the first call, whether the
    /// subsequent code exchange succeeds or not. The remove happens under
    /// one lock acquisition, so two racing callbacks for the same state
    /// cannot both obtain the verifier.
    pub fn take_code_verifier(&self, state: &str) -> Option<String> {
        let mut verifiers = self.verifiers.lock().unwrap();
        verifiers.remove(state)
    }

    /// Encrypts and stores a token grant for `user_id`, stamping it with
    /// the current time. Overwrites any prior record for that user.
    pub fn store_tokens(&self, user_id: &str, grant: &TokenGrant) -> Result<()> {
        let record = TokenRecord {
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            expires_in: grant.expires_in,
            scope: grant.scope.clone(),
            token_type: grant.token_type.clone(),
            stored_at: Utc::now(),
        };

        let serialized =
            serde_json::to_string(&record).context("failed to serialize token record")?;
        let (ciphertext, nonce) = encryption::encrypt(&serialized, &self.encryption_key)
            .context("failed to encrypt token record")?;

        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(user_id.to_string(), SealedRecord { ciphertext, nonce });
        debug!(user_id = %user_id, "stored encrypted token record");

        Ok(())
    }

    /// Decrypts and returns the token record for `user_id`.
    ///
    /// Returns `None` when no record exists. A record that fails to
    /// decrypt or deserialize is evicted and also reported as `None`, so
    /// corruption self-heals instead of surfacing repeatedly.
    pub fn get_tokens(&self, user_id: &str) -> Option<TokenRecord> {
        let mut tokens = self.tokens.lock().unwrap();
        let sealed = tokens.get(user_id)?;

        let record = encryption::decrypt(&sealed.ciphertext, &sealed.nonce, &self.encryption_key)
            .and_then(|plaintext| {
                serde_json::from_str::<TokenRecord>(&plaintext)
                    .context("failed to deserialize token record")
            });

        match record {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "evicting corrupt token record");
                tokens.remove(user_id);
                None
            }
        }
    }

    /// Removes the token record for `user_id`, returning whether one existed.
    pub fn delete_tokens(&self, user_id: &str) -> bool {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.remove(user_id).is_some()
    }

    /// Whether the stored access token is expired.
    ///
    /// Returns `true` when no record exists or when the current time has
    /// reached `stored_at + expires_in`. Callers treat expired and absent
    /// identically as "not usable".
    pub fn is_token_expired(&self, user_id: &str) -> bool {
        match self.get_tokens(user_id) {
            None => true,
            Some(record) => {
                let expiry = record.stored_at + Duration::seconds(record.expires_in);
                Utc::now() >= expiry
            }
        }
    }
}
