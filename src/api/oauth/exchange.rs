//! Token exchange against the Azure AD token endpoint.
//!
//! Handles the authorization-code and refresh-token grants, and extracts
//! the user's object id from the id_token the endpoint returns.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::provider;
use crate::config::Settings;
use crate::credentials::TokenGrant;

/// Standard OAuth 2.0 token response, plus the OpenID Connect id_token.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Converts to the storable grant, filling in the provider's usual
    /// defaults for fields it omitted.
    pub fn to_grant(&self) -> TokenGrant {
        TokenGrant {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_in: self.expires_in.unwrap_or(3600),
            scope: self.scope.clone().unwrap_or_default(),
            token_type: self
                .token_type
                .clone()
                .unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}

/// Exchanges an authorization code (plus its PKCE verifier) for tokens.
pub async fn exchange_code(
    settings: &Settings,
    code: &str,
    code_verifier: &str,
) -> Result<TokenResponse> {
    let scopes = settings.scopes.join(" ");

    let mut form_data = HashMap::new();
    form_data.insert("grant_type", "authorization_code");
    form_data.insert("code", code);
    form_data.insert("redirect_uri", settings.redirect_uri.as_str());
    form_data.insert("client_id", settings.client_id.as_str());
    form_data.insert("code_verifier", code_verifier);
    form_data.insert("scope", scopes.as_str());
    if !settings.client_secret.is_empty() {
        form_data.insert("client_secret", settings.client_secret.as_str());
    }

    post_token_request(&settings.tenant_id, &form_data).await
}

/// Obtains a fresh access token from a refresh token.
pub async fn refresh_tokens(settings: &Settings, refresh_token: &str) -> Result<TokenResponse> {
    let scopes = settings.scopes.join(" ");

    let mut form_data = HashMap::new();
    form_data.insert("grant_type", "refresh_token");
    form_data.insert("refresh_token", refresh_token);
    form_data.insert("client_id", settings.client_id.as_str());
    form_data.insert("scope", scopes.as_str());
    if !settings.client_secret.is_empty() {
        form_data.insert("client_secret", settings.client_secret.as_str());
    }

    post_token_request(&settings.tenant_id, &form_data).await
}

async fn post_token_request(
    tenant_id: &str,
    form_data: &HashMap<&str, &str>,
) -> Result<TokenResponse> {
    let endpoints = provider::azure_endpoints(tenant_id);
    let client = reqwest::Client::new();

    tracing::debug!(token_url = %endpoints.token_url, "requesting tokens");

    let response = client
        .post(&endpoints.token_url)
        .header("Accept", "application/json")
        .form(form_data)
        .send()
        .await
        .context("failed to send token request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow!("token request failed with status {}: {}", status, body));
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .context("failed to parse token response")?;

    tracing::debug!(
        has_refresh_token = token_response.refresh_token.is_some(),
        expires_in = ?token_response.expires_in,
        "token request successful"
    );

    Ok(token_response)
}

/// Reads the `oid` claim (the user's directory object id) out of an
/// id_token payload.
///
/// The token arrives directly from the token endpoint over TLS, so the
/// claim is read without signature verification.
pub fn extract_object_id(id_token: &str) -> Option<String> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims["oid"].as_str().map(String::from)
}
