use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogItem, FilterCriteria, RankedResult},
    services::{
        availability::AvailabilityResolver,
        filters::FilterPipeline,
        loader::{BulkLoader, CatalogSnapshot},
        ranking, search,
    },
    store::RemoteStore,
};

/// Entry point for the application layer
///
/// Holds no catalog state of its own: callers keep the snapshot returned by
/// [`DiscoveryEngine::load_all`] and pass it back in. Concurrent calls never interfere and
/// a stale result can simply be dropped.
#[derive(Clone)]
pub struct DiscoveryEngine {
    loader: BulkLoader,
    pipeline: FilterPipeline,
}

impl DiscoveryEngine {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_loader(BulkLoader::new(Arc::clone(&store)), store)
    }

    /// Uses a pre-configured loader (batch size, parallelism) for the catalog reads.
    pub fn with_loader(loader: BulkLoader, store: Arc<dyn RemoteStore>) -> Self {
        Self {
            loader,
            pipeline: FilterPipeline::new(AvailabilityResolver::new(store)),
        }
    }

    pub async fn load_all(&self) -> AppResult<CatalogSnapshot> {
        self.loader.load_all().await
    }

    pub async fn apply_filters(
        &self,
        items: &[CatalogItem],
        criteria: &FilterCriteria,
    ) -> Vec<CatalogItem> {
        self.pipeline.apply(items, criteria).await
    }

    /// Filters, then sorts with the effective key for `criteria`.
    pub async fn rank(&self, items: &[CatalogItem], criteria: &FilterCriteria) -> RankedResult {
        let filtered = self.apply_filters(items, criteria).await;
        let (sort_by, ascending) = ranking::effective_sort(criteria);
        let items = ranking::sort(&filtered, sort_by, ascending);

        tracing::debug!(
            requested = ?criteria.sort_by,
            applied = ?sort_by,
            ascending,
            results = items.len(),
            "Results ranked"
        );

        RankedResult {
            items,
            sort_by,
            ascending,
        }
    }

    pub fn search(&self, items: &[CatalogItem], query: &str) -> Vec<CatalogItem> {
        search::quick_search(items, query)
    }

    /// Loads the catalog and counts what `criteria` would return, for result previews.
    pub async fn get_filter_result_count(&self, criteria: &FilterCriteria) -> AppResult<usize> {
        let snapshot = self.load_all().await?;
        let count = self.apply_filters(&snapshot.items, criteria).await.len();

        tracing::info!(
            count,
            catalog = snapshot.items.len(),
            complete = snapshot.is_complete(),
            "Filter result count computed"
        );

        Ok(count)
    }
}
