use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_api::{build_cors_layer, build_router, config::AppConfig, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if dotenvy::dotenv().is_err() {
        tracing::warn!("Could not load .env file, using process environment");
    }
    let config = AppConfig::from_env()?;

    tracing::info!("Starting vault-api server");

    let pool = db::establish_connection_pool(&config)?;
    db::ping(&pool)
        .await
        .context("Failed to reach the database")?;
    tracing::info!("Connected to database");

    let cors = build_cors_layer(config.cors_allowed_origins.as_deref());
    let app = build_router(AppState::new(&config, pool), cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}, GraphiQL at http://{}/", addr, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
