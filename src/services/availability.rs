use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, ItemKey, MediaKind, ProviderAvailability, ProviderId, QuorumMode},
    store::{Column, FilterValue, FilterValues, Predicate, RemoteStore, Table, STORE_ROW_CAP},
};

/// Resolves which catalog items are offered by a set of streaming providers in a region
///
/// Evaluation failures are fail-open: the input is returned unfiltered and the failure is
/// logged, so an unavailable availability table degrades the search rather than breaking it.
#[derive(Clone)]
pub struct AvailabilityResolver {
    store: Arc<dyn RemoteStore>,
}

impl AvailabilityResolver {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Items offered by any (or every, under [`QuorumMode::All`]) requested provider.
    ///
    /// Preserves input order; never mutates `items`.
    pub async fn filter_by_providers(
        &self,
        items: &[CatalogItem],
        provider_ids: &[ProviderId],
        mode: QuorumMode,
        region: &str,
    ) -> Vec<CatalogItem> {
        if items.is_empty() || provider_ids.is_empty() {
            return items.to_vec();
        }

        let requested: HashSet<ProviderId> = provider_ids.iter().copied().collect();

        let outcome = match mode {
            QuorumMode::Any => self.any_matches(items, &requested, region).await,
            QuorumMode::All => self.all_matches(items, &requested, region).await,
        };

        match outcome {
            Ok(matched) => {
                let filtered: Vec<CatalogItem> = items
                    .iter()
                    .filter(|item| matched.contains(&item.key()))
                    .cloned()
                    .collect();

                tracing::info!(
                    mode = ?mode,
                    region = %region,
                    providers = requested.len(),
                    input = items.len(),
                    output = filtered.len(),
                    "Provider filter applied"
                );

                filtered
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    transient = e.is_transient(),
                    mode = ?mode,
                    region = %region,
                    providers = requested.len(),
                    "Provider filter unavailable, returning results unfiltered"
                );
                items.to_vec()
            }
        }
    }

    /// Keys offered by at least one requested provider.
    ///
    /// Tries the unrestricted provider query first; a response at the row cap may be
    /// truncated, so it is redone restricted to the candidate ids.
    async fn any_matches(
        &self,
        items: &[CatalogItem],
        requested: &HashSet<ProviderId>,
        region: &str,
    ) -> AppResult<HashSet<ItemKey>> {
        let filters = vec![
            provider_predicate(requested),
            Predicate::Eq(Column::Region, FilterValue::Text(region.to_string())),
        ];
        let rows = self
            .store
            .predicate_query(Table::ProviderAvailability, &filters)
            .await?;

        let availability = if rows.len() >= STORE_ROW_CAP {
            tracing::debug!(
                rows = rows.len(),
                cap = STORE_ROW_CAP,
                "Provider query saturated, restricting to candidate ids"
            );
            self.fetch_for_candidates(items, requested, region).await?
        } else {
            decode_availability(rows)
        };

        Ok(availability
            .into_iter()
            .filter(|row| requested.contains(&row.provider_id) && row.region == region)
            .map(|row| row.item_key())
            .collect())
    }

    /// Keys whose distinct matched providers cover every requested provider.
    async fn all_matches(
        &self,
        items: &[CatalogItem],
        requested: &HashSet<ProviderId>,
        region: &str,
    ) -> AppResult<HashSet<ItemKey>> {
        let availability = self.fetch_for_candidates(items, requested, region).await?;

        let mut matched: HashMap<ItemKey, HashSet<ProviderId>> = HashMap::new();
        for row in availability {
            if requested.contains(&row.provider_id) && row.region == region {
                matched
                    .entry(row.item_key())
                    .or_default()
                    .insert(row.provider_id);
            }
        }

        Ok(matched
            .into_iter()
            .filter(|(_, providers)| providers.is_superset(requested))
            .map(|(key, _)| key)
            .collect())
    }

    /// Availability rows restricted to the candidates, queried per media kind in id chunks.
    ///
    /// A chunk's complete answer stays below the store row cap, so a response that reaches
    /// the cap carries duplicate rows and may be truncated: the chunk is split and queried
    /// again. A single id that still reaches the cap cannot be evaluated and is an error.
    async fn fetch_for_candidates(
        &self,
        items: &[CatalogItem],
        requested: &HashSet<ProviderId>,
        region: &str,
    ) -> AppResult<Vec<ProviderAvailability>> {
        let mut by_kind: BTreeMap<MediaKind, Vec<i64>> = BTreeMap::new();
        for item in items {
            by_kind
                .entry(item.media_kind)
                .or_default()
                .push(item.external_id);
        }

        let chunk_size = candidate_chunk_size(requested.len());
        let mut availability = Vec::new();
        let mut queries = 0usize;

        for (kind, ids) in by_kind.iter_mut() {
            ids.sort_unstable();
            ids.dedup();

            let mut pending: Vec<&[i64]> = ids.chunks(chunk_size).rev().collect();
            while let Some(chunk) = pending.pop() {
                let filters = vec![
                    Predicate::In(Column::ExternalId, FilterValues::Ints(chunk.to_vec())),
                    Predicate::Eq(Column::MediaKind, FilterValue::Text(kind.to_string())),
                    provider_predicate(requested),
                    Predicate::Eq(Column::Region, FilterValue::Text(region.to_string())),
                ];
                let rows = self
                    .store
                    .predicate_query(Table::ProviderAvailability, &filters)
                    .await?;
                queries += 1;

                if rows.len() < STORE_ROW_CAP {
                    availability.extend(decode_availability(rows));
                    continue;
                }

                if let [id] = chunk {
                    return Err(AppError::Store(format!(
                        "availability for {} {} reaches the {} row cap",
                        kind, id, STORE_ROW_CAP
                    )));
                }

                tracing::debug!(
                    media_kind = %kind,
                    ids = chunk.len(),
                    rows = rows.len(),
                    "Candidate chunk saturated, splitting"
                );
                let (head, tail) = chunk.split_at(chunk.len() / 2);
                pending.push(tail);
                pending.push(head);
            }
        }

        tracing::debug!(
            candidates = items.len(),
            queries,
            rows = availability.len(),
            "Candidate availability fetched"
        );

        Ok(availability)
    }
}

/// Ids per restricted query: at most one row per (id, provider), and ids * providers < cap
/// so that a complete chunk never fills a response.
fn candidate_chunk_size(provider_count: usize) -> usize {
    ((STORE_ROW_CAP - 1) / provider_count.max(1)).max(1)
}

fn provider_predicate(requested: &HashSet<ProviderId>) -> Predicate {
    let mut ids: Vec<i64> = requested.iter().map(|&id| id as i64).collect();
    ids.sort_unstable();
    Predicate::In(Column::ProviderId, FilterValues::Ints(ids))
}

fn decode_availability(rows: Vec<Value>) -> Vec<ProviderAvailability> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<ProviderAvailability>(row) {
            Ok(availability) => Some(availability),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed availability row");
                None
            }
        })
        .collect()
}
