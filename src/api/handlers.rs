use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CatalogItem, FilterCriteria, SortKey},
    services::DataIntegrityWarning,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub loaded: usize,
    pub expected_total: usize,
    pub warning: Option<DataIntegrityWarning>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub total: usize,
    pub sort_by: SortKey,
    pub ascending: bool,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub items: Vec<CatalogItem>,
}

/// Parses request criteria; a request without a region uses the configured default.
fn criteria_from_body(state: &AppState, body: Value) -> AppResult<FilterCriteria> {
    let has_region = body.get("region").is_some();
    let mut criteria: FilterCriteria = serde_json::from_value(body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid criteria: {}", e)))?;
    if !has_region {
        criteria.region = state.default_region.clone();
    }
    Ok(criteria)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Reload the catalog snapshot from the remote store
pub async fn refresh_catalog(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<RefreshResponse>> {
    tracing::info!(request_id = %request_id, "Refreshing catalog");

    let snapshot = state.refresh_catalog().await?;

    Ok(Json(RefreshResponse {
        loaded: snapshot.items.len(),
        expected_total: snapshot.expected_total,
        warning: snapshot.warning.clone(),
    }))
}

/// Filter and rank the catalog
pub async fn discover(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> AppResult<Json<DiscoverResponse>> {
    let criteria = criteria_from_body(&state, body)?;
    tracing::info!(
        request_id = %request_id,
        active_filters = ?criteria.active_filters(),
        sort_by = ?criteria.sort_by,
        "Processing discover request"
    );

    let snapshot = state.catalog().await?;
    let ranked = state.engine.rank(&snapshot.items, &criteria).await;

    Ok(Json(DiscoverResponse {
        total: ranked.len(),
        sort_by: ranked.sort_by,
        ascending: ranked.ascending,
        items: ranked.items,
    }))
}

/// Number of results a set of criteria would produce
pub async fn discover_count(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> AppResult<Json<CountResponse>> {
    let criteria = criteria_from_body(&state, body)?;
    tracing::info!(
        request_id = %request_id,
        active_filters = ?criteria.active_filters(),
        "Processing discover count request"
    );

    let count = state.engine.get_filter_result_count(&criteria).await?;
    Ok(Json(CountResponse { count }))
}

/// Title search over the session catalog
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let snapshot = state.catalog().await?;
    let items = state.engine.search(&snapshot.items, &params.q);

    tracing::debug!(
        request_id = %request_id,
        query = %params.q,
        results = items.len(),
        "Quick search completed"
    );

    Ok(Json(SearchResponse {
        total: items.len(),
        items,
    }))
}
