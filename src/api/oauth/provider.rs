//! Azure AD endpoint construction and authorization URL building.

use crate::config::Settings;

/// OAuth 2.0 endpoints for an Azure AD tenant.
#[derive(Clone, Debug)]
pub struct ProviderEndpoints {
    /// Authorization endpoint the user's browser is sent to
    pub authorize_url: String,

    /// Token endpoint for code and refresh exchanges
    pub token_url: String,
}

/// Builds the v2.0 endpoints for `tenant_id`.
pub fn azure_endpoints(tenant_id: &str) -> ProviderEndpoints {
    ProviderEndpoints {
        authorize_url: format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/authorize",
            tenant_id
        ),
        token_url: format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            tenant_id
        ),
    }
}

/// Builds the authorization URL a login request redirects to, carrying
/// the CSRF state and the PKCE challenge (S256).
pub fn build_auth_url(settings: &Settings, state: &str, code_challenge: &str) -> String {
    let endpoints = azure_endpoints(&settings.tenant_id);
    let scopes = settings.scopes.join(" ");

    format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&response_mode=query&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        endpoints.authorize_url,
        urlencoding::encode(&settings.client_id),
        urlencoding::encode(&settings.redirect_uri),
        urlencoding::encode(&scopes),
        urlencoding::encode(state),
        urlencoding::encode(code_challenge),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            client_id: "test-client-id".to_string(),
            tenant_id: "test-tenant".to_string(),
            redirect_uri: "http://localhost:8000/auth/callback".to_string(),
            client_secret: String::new(),
            scopes: vec!["User.Read".to_string(), "Mail.Send".to_string()],
            secret_key: "secret".to_string(),
            bind_addr: "0.0.0.0:8000".to_string(),
        }
    }

    #[test]
    fn test_endpoints_embed_tenant() {
        let endpoints = azure_endpoints("contoso");
        assert_eq!(
            endpoints.authorize_url,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize"
        );
        assert_eq!(
            endpoints.token_url,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_auth_url_carries_pkce_and_state() {
        let url = build_auth_url(&test_settings(), "random_state", "challenge_abc");

        assert!(url.starts_with(
            "https://login.microsoftonline.com/test-tenant/oauth2/v2.0/authorize?"
        ));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fauth%2Fcallback"));
        assert!(url.contains("scope=User.Read%20Mail.Send"));
        assert!(url.contains("state=random_state"));
        assert!(url.contains("code_challenge=challenge_abc"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("response_type=code"));
    }
}
