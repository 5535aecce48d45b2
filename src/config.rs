//! Environment-backed application settings.
//!
//! Every value has a development default except the Azure AD application
//! coordinates, whose absence is reported by the health endpoint.

/// Application settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Azure AD application (client) id
    pub client_id: String,

    /// Azure AD directory (tenant) id
    pub tenant_id: String,

    /// Redirect URI registered for the application
    pub redirect_uri: String,

    /// Client secret; empty for public-client (PKCE-only) registrations
    pub client_secret: String,

    /// OAuth scopes requested at login
    pub scopes: Vec<String>,

    /// Secret the token-storage encryption key is derived from
    pub secret_key: String,

    /// Address the HTTP server binds to
    pub bind_addr: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn default_scopes() -> Vec<String> {
    [
        "User.Read",
        "Mail.ReadWrite",
        "Mail.Send",
        "Calendars.ReadWrite",
        "MailboxSettings.Read",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Settings {
    /// Loads settings from `GRAPHGATE_*` environment variables, filling
    /// in defaults for everything optional.
    pub fn from_env() -> Self {
        let scopes = match std::env::var("GRAPHGATE_SCOPES") {
            Ok(raw) if !raw.trim().is_empty() => {
                raw.split_whitespace().map(String::from).collect()
            }
            _ => default_scopes(),
        };

        Self {
            client_id: env_or("GRAPHGATE_CLIENT_ID", ""),
            tenant_id: env_or("GRAPHGATE_TENANT_ID", ""),
            redirect_uri: env_or(
                "GRAPHGATE_REDIRECT_URI",
                "http://localhost:8000/auth/callback",
            ),
            client_secret: env_or("GRAPHGATE_CLIENT_SECRET", ""),
            scopes,
            secret_key: env_or("GRAPHGATE_SECRET_KEY", "change-this-secret-in-production"),
            bind_addr: env_or("GRAPHGATE_BIND_ADDR", "0.0.0.0:8000"),
        }
    }

    /// Names of required variables that are unset or empty.
    ///
    /// The service still starts without them (so the health endpoint can
    /// say what is wrong), but no login flow can complete.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.is_empty() {
            missing.push("GRAPHGATE_CLIENT_ID");
        }
        if self.tenant_id.is_empty() {
            missing.push("GRAPHGATE_TENANT_ID");
        }
        if self.redirect_uri.is_empty() {
            missing.push("GRAPHGATE_REDIRECT_URI");
        }
        missing
    }
}
