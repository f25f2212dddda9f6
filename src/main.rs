use anyhow::{Context, Result};
use axum::Router;
use courier::api::{create_location_router, create_ws_router, LocationAppState, WsAppState};
use courier::auth::AllowAny;
use courier::config::{load_config, CourierConfig};
use courier::location::LocationRegistry;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=info".into()),
        )
        .init();

    info!("Courier hub starting...");

    // Configuration: optional TOML file, env override for the bind address
    let config = match std::env::var("COURIER_CONFIG") {
        Ok(path) => load_config(&path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => CourierConfig::default(),
    };

    let bind_addr = std::env::var("COURIER_BIND_ADDR").unwrap_or(config.server.bind_addr.clone());

    info!(bind_addr = %bind_addr, "Configuration loaded");

    // Shared registry: the single source of last-known agent locations
    let registry = Arc::new(LocationRegistry::new());

    let ws_state = Arc::new(WsAppState {
        registry: Arc::clone(&registry),
        identity_policy: Arc::new(AllowAny),
    });
    let location_state = Arc::new(LocationAppState {
        registry: Arc::clone(&registry),
    });

    // Browser clients connect cross-origin
    let router = Router::new()
        .merge(create_ws_router(ws_state))
        .merge(create_location_router(location_state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, "Courier hub listening");

    axum::serve(listener, router)
        .await
        .context("Hub server error")?;

    Ok(())
}
