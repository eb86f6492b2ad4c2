mod config;
mod db;
mod error;
mod metrics;
mod models;
mod routes;
mod services;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, StoreBackend};
use crate::db::{create_pool, run_migrations, MemoryStore, PgStore, PostgrestStore, Store};
use crate::services::{AdminService, UserService};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub admin: AdminService,
    pub users: UserService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            admin: AdminService::new(store.clone()),
            users: UserService::new(store.clone()),
            store,
            start_time: Instant::now(),
        }
    }
}

/// Build the store selected by configuration
async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.resolved_backend() {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;

            let pool = create_pool(database_url, config.db_max_connections).await?;
            tracing::info!("PostgreSQL connected");

            if config.run_migrations {
                run_migrations(&pool).await?;
            }

            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Postgrest => {
            let url = config
                .supabase_url
                .as_deref()
                .context("SUPABASE_URL must be set for the postgrest backend")?;
            let key = config
                .supabase_key
                .as_deref()
                .context("SUPABASE_KEY must be set for the postgrest backend")?;

            let store = PostgrestStore::new(url, key)?;
            tracing::info!("PostgREST client configured for {}", url);
            Ok(Arc::new(store))
        }
        StoreBackend::Memory | StoreBackend::Auto => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "song_catalog_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();

    tracing::info!("Starting Song Catalog Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app_env);
    tracing::info!("Store backend: {}", config.resolved_backend());

    let store = connect_store(&config).await?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    let state = Arc::new(AppState::new(config, store));

    // Build router
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
