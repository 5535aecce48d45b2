use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use graphgate::api::{
    create_auth_router, create_graph_router, create_health_router, AuthAppState, GraphAppState,
};
use graphgate::config::Settings;
use graphgate::credentials::TokenStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graphgate=info".into()),
        )
        .init();

    let settings = Arc::new(Settings::from_env());
    let store = Arc::new(TokenStore::new(&settings.secret_key));

    let missing = settings.missing_required();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            "starting without required Azure AD settings; login flows will fail"
        );
    }

    let app = create_health_router(settings.clone())
        .merge(create_auth_router(AuthAppState {
            store: store.clone(),
            settings: settings.clone(),
        }))
        .merge(create_graph_router(GraphAppState { store }));

    info!(addr = %settings.bind_addr, "graphgate listening");
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
