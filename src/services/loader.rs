use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, ItemKey},
    store::{Column, RemoteStore, RowRange, Table, STORE_ROW_CAP},
};

/// Stable ordering for paging; (external_id, media_kind) is the catalog's identity
const CATALOG_ORDER: [Column; 2] = [Column::ExternalId, Column::MediaKind];

/// Retrieved fewer catalog rows than the store reported
///
/// Non-fatal: the partial catalog is still usable, the caller decides whether to retry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DataIntegrityWarning {
    pub expected: usize,
    pub retrieved: usize,
    /// Ranges whose request failed outright
    pub failed_ranges: Vec<(usize, usize)>,
}

impl DataIntegrityWarning {
    pub fn missing(&self) -> usize {
        self.expected.saturating_sub(self.retrieved)
    }
}

/// Full catalog materialized from the remote store
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
    pub expected_total: usize,
    pub loaded_at: DateTime<Utc>,
    pub warning: Option<DataIntegrityWarning>,
}

impl CatalogSnapshot {
    pub fn is_complete(&self) -> bool {
        self.warning.is_none()
    }
}

/// Pages the catalog table past the store's per-request row cap
#[derive(Clone)]
pub struct BulkLoader {
    store: Arc<dyn RemoteStore>,
    batch_size: usize,
    parallel: bool,
}

impl BulkLoader {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            batch_size: STORE_ROW_CAP,
            parallel: false,
        }
    }

    /// Rows per range request, clamped to `1..=STORE_ROW_CAP`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        let clamped = batch_size.clamp(1, STORE_ROW_CAP);
        if clamped != batch_size {
            tracing::warn!(
                requested = batch_size,
                applied = clamped,
                cap = STORE_ROW_CAP,
                "Batch size outside store row cap, clamped"
            );
        }
        self.batch_size = clamped;
        self
    }

    /// Issue all range requests concurrently instead of one after another.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Materializes the whole catalog.
    ///
    /// Only a failed row count is returned as an error. A failed batch is logged and
    /// skipped; any shortfall against the count is reported on the snapshot.
    pub async fn load_all(&self) -> AppResult<CatalogSnapshot> {
        let expected_total = self.store.count(Table::Catalog).await?;
        let ranges = plan_ranges(expected_total, self.batch_size);

        tracing::info!(
            expected_total,
            batches = ranges.len(),
            batch_size = self.batch_size,
            parallel = self.parallel,
            store = self.store.name(),
            "Loading catalog"
        );

        let results = if self.parallel {
            self.fetch_parallel(&ranges).await
        } else {
            self.fetch_sequential(&ranges).await
        };

        let mut items = Vec::with_capacity(expected_total);
        let mut seen: HashSet<ItemKey> = HashSet::with_capacity(expected_total);
        let mut failed_ranges = Vec::new();
        let mut undecodable = 0usize;
        let mut duplicates = 0usize;

        for (range, result) in ranges.iter().zip(results) {
            let rows = match result {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!(
                        range = %range,
                        error = %e,
                        transient = e.is_transient(),
                        "Catalog batch failed, skipping"
                    );
                    failed_ranges.push((range.start, range.end));
                    continue;
                }
            };

            for row in rows {
                match serde_json::from_value::<CatalogItem>(row) {
                    Ok(item) => {
                        if seen.insert(item.key()) {
                            items.push(item);
                        } else {
                            duplicates += 1;
                        }
                    }
                    Err(e) => {
                        undecodable += 1;
                        tracing::warn!(range = %range, error = %e, "Skipping undecodable catalog row");
                    }
                }
            }
        }

        if duplicates > 0 {
            tracing::warn!(duplicates, "Dropped duplicate catalog rows");
        }

        let warning = (items.len() < expected_total).then(|| DataIntegrityWarning {
            expected: expected_total,
            retrieved: items.len(),
            failed_ranges,
        });

        match &warning {
            Some(w) => tracing::warn!(
                expected = w.expected,
                retrieved = w.retrieved,
                missing = w.missing(),
                failed_batches = w.failed_ranges.len(),
                undecodable,
                "Catalog load incomplete"
            ),
            None => tracing::info!(loaded = items.len(), "Catalog loaded"),
        }

        Ok(CatalogSnapshot {
            items,
            expected_total,
            loaded_at: Utc::now(),
            warning,
        })
    }

    async fn fetch_sequential(&self, ranges: &[RowRange]) -> Vec<AppResult<Vec<Value>>> {
        let mut results = Vec::with_capacity(ranges.len());
        for range in ranges {
            results.push(
                self.store
                    .range_query(Table::Catalog, *range, &CATALOG_ORDER)
                    .await,
            );
        }
        results
    }

    /// Results come back in range order regardless of completion order.
    async fn fetch_parallel(&self, ranges: &[RowRange]) -> Vec<AppResult<Vec<Value>>> {
        let mut tasks = Vec::with_capacity(ranges.len());

        for range in ranges.iter().copied() {
            let store = Arc::clone(&self.store);
            let task = tokio::spawn(async move {
                store
                    .range_query(Table::Catalog, range, &CATALOG_ORDER)
                    .await
            });
            tasks.push(task);
        }

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                    Err(AppError::Internal(e.to_string()))
                }
            });
        }
        results
    }
}

/// Contiguous, non-overlapping ranges covering `[0, total)`; `end = start + batch_size - 1`.
pub fn plan_ranges(total: usize, batch_size: usize) -> Vec<RowRange> {
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size)
        .map(|start| RowRange::starting_at(start, batch_size))
        .collect()
}
