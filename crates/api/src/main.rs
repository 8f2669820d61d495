use anyhow::{Context, Result};
use companion_api::{build_app, ApiConfig};
use companion_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("companion_api");

    let config = ApiConfig::from_env();
    let bind = config.bind.clone();
    let store = if config.database_url.is_some() {
        "sqlite"
    } else {
        "memory"
    };

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed binding {}", bind))?;
    tracing::info!(bind = %bind, store, "student companion api started");

    axum::serve(listener, app).await?;
    Ok(())
}
