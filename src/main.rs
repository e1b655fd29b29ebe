use std::sync::Arc;
use std::time::Duration;

use catalog_discovery::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    services::{BulkLoader, DiscoveryEngine},
    store::{postgres::create_pool, PgStore, PostgrestStore, RemoteStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_discovery=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let timeout = Duration::from_secs(config.store_timeout_secs);

    let store: Arc<dyn RemoteStore> = match config.store_backend {
        StoreBackend::Rest => Arc::new(PostgrestStore::new(
            config.store_url.clone(),
            config.store_api_key.clone(),
            timeout,
        )?),
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url, timeout).await?;
            Arc::new(PgStore::new(pool))
        }
    };

    tracing::info!(
        backend = store.name(),
        batch_size = config.batch_size,
        parallel_batches = config.parallel_batches,
        "Remote store configured"
    );

    let loader = BulkLoader::new(Arc::clone(&store))
        .with_batch_size(config.batch_size)
        .with_parallel(config.parallel_batches);
    let engine = DiscoveryEngine::with_loader(loader, store);
    let state = AppState::new(engine, config.default_region.clone());

    // Warm the session catalog; a failure here is retried lazily on the first request.
    if let Err(e) = state.refresh_catalog().await {
        tracing::warn!(error = %e, "Initial catalog load failed");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
