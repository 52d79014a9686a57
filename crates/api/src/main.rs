mod config;
mod error;
mod extract;
mod middleware;
mod response;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use campus_cms_core::{Catalog, DocumentStore, MemoryStore, PgStore};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("Failed to load config")?;

    init_tracing(&config);
    tracing::info!(backend = ?config.store_backend, "Starting campus CMS API server");

    let store = open_store(&config).await?;

    // Keyed resources rely on the store to reject duplicate keys.
    let catalog = Catalog::site();
    for schema in catalog.iter() {
        if let Some(key) = schema.unique_key {
            store
                .ensure_unique(&schema.collection, key)
                .await
                .with_context(|| format!("Failed to create unique index on {}.{key}", schema.collection))?;
        }
    }
    tracing::info!(resources = catalog.len(), "Resource catalog registered");

    let state = state::AppState::new(Arc::clone(&store), catalog, config.clone());

    let app = routes::build_router(state)
        .layer(middleware::body_limit::body_limit_layer(config.body_limit_bytes))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer(&config.cors_origins));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;
            let store = PgStore::connect(url, config.db_max_connections, config.db_min_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to PostgreSQL");

            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Database migrations applied");
            Ok(Arc::new(store))
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
