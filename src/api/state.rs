use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::services::{CatalogSnapshot, DiscoveryEngine};

/// Shared application state
///
/// The engine itself is stateless; the session's catalog snapshot lives here and is
/// replaced wholesale on refresh.
#[derive(Clone)]
pub struct AppState {
    pub engine: DiscoveryEngine,
    pub default_region: String,
    pub catalog: Arc<RwLock<Option<Arc<CatalogSnapshot>>>>,
}

impl AppState {
    /// Creates state with no catalog loaded yet
    pub fn new(engine: DiscoveryEngine, default_region: String) -> Self {
        Self {
            engine,
            default_region,
            catalog: Arc::new(RwLock::new(None)),
        }
    }

    /// Loads the catalog and replaces the session snapshot
    pub async fn refresh_catalog(&self) -> AppResult<Arc<CatalogSnapshot>> {
        let snapshot = Arc::new(self.engine.load_all().await?);
        *self.catalog.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Returns the session snapshot, loading it on first use
    ///
    /// The first load holds the write lock, so concurrent first requests share one load.
    pub async fn catalog(&self) -> AppResult<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.catalog.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.catalog.write().await;
        // Loaded by another request while this one waited for the lock.
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.engine.load_all().await?);
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
