use anyhow::Result;
use evalboard_api::{health_routes, routes, AppState};
use evalboard_storage::{PoolSettings, Stores};
use evalboard_workflow::OpenAiCompatClient;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::{Config, LogFormat, StorageBackend, StorageConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config);

    tracing::info!("Starting evalboard server");

    let stores = build_stores(&config.storage).await?;
    let provider = OpenAiCompatClient::new(&config.provider)?;
    let state = AppState::new(stores, Arc::new(provider), &config.workflow);

    let app = health_routes(state.clone())
        .nest("/api/v1", routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server.addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_stores(storage: &StorageConfig) -> Result<Stores> {
    match storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Stores::memory())
        }
        StorageBackend::Postgres => {
            let settings = PoolSettings {
                database_url: storage.database_url.clone(),
                max_connections: storage.max_connections,
                min_connections: storage.min_connections,
                acquire_timeout: Duration::from_secs(storage.acquire_timeout_seconds),
            };
            let pool = evalboard_storage::create_pool_with_settings(&settings).await?;
            tracing::info!("Database pool initialized");

            if storage.run_migrations {
                evalboard_storage::migrate(&pool).await?;
            }
            Ok(Stores::postgres(pool))
        }
    }
}
