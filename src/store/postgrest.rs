//! PostgREST-compatible store (e.g. a hosted Supabase project)
//!
//! Request shapes:
//! - count: `HEAD /{table}` with `Prefer: count=exact`, total read from `Content-Range: 0-0/N`
//! - range: `GET /{table}?order=...` with `Range: start-end`
//! - predicate: `GET /{table}?col=eq.v&col=in.(a,b)&limit=cap`
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client as HttpClient, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    store::{Column, FilterValues, Predicate, RemoteStore, RowRange, Table, STORE_ROW_CAP},
};

#[derive(Clone)]
pub struct PostgrestStore {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl PostgrestStore {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn check_status(table: Table, response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            table = %table,
            status = %status,
            body = %body,
            "Remote store request failed"
        );
        Err(AppError::Store(format!(
            "Store returned status {} for {}: {}",
            status, table, body
        )))
    }
}

/// Renders one predicate as a PostgREST query parameter pair
fn predicate_param(predicate: &Predicate) -> (String, String) {
    match predicate {
        Predicate::Eq(column, value) => (column.to_string(), format!("eq.{}", value)),
        Predicate::In(column, values) => {
            let list = match values {
                FilterValues::Ints(values) => values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                FilterValues::Texts(values) => values
                    .iter()
                    .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                    .collect::<Vec<_>>()
                    .join(","),
            };
            (column.to_string(), format!("in.({})", list))
        }
    }
}

/// Query string for a predicate read, capped at [`STORE_ROW_CAP`] rows
fn predicate_params(filters: &[Predicate]) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filters.iter().map(predicate_param));
    params.push(("limit".to_string(), STORE_ROW_CAP.to_string()));
    params
}

fn order_param(order_by: &[Column]) -> String {
    order_by
        .iter()
        .map(|column| format!("{}.asc", column))
        .collect::<Vec<_>>()
        .join(",")
}

/// Extracts the total from a `Content-Range` header such as `0-0/2500` or `*/0`
fn parse_content_range_total(headers: &HeaderMap) -> AppResult<usize> {
    let raw = headers
        .get("content-range")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Store("Count response missing Content-Range".to_string()))?;

    raw.rsplit_once('/')
        .and_then(|(_, total)| total.parse::<usize>().ok())
        .ok_or_else(|| AppError::Store(format!("Unparseable Content-Range: {}", raw)))
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn count(&self, table: Table) -> AppResult<usize> {
        let request = self
            .http_client
            .head(self.table_url(table))
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .query(&[("select", Column::ExternalId.as_str())]);

        let response = self.authorized(request).send().await?;
        let response = Self::check_status(table, response).await?;
        let total = parse_content_range_total(response.headers())?;

        tracing::debug!(table = %table, total, store = self.name(), "Row count fetched");

        Ok(total)
    }

    async fn range_query(
        &self,
        table: Table,
        range: RowRange,
        order_by: &[Column],
    ) -> AppResult<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if !order_by.is_empty() {
            params.push(("order".to_string(), order_param(order_by)));
        }

        let request = self
            .http_client
            .get(self.table_url(table))
            .header("Range-Unit", "items")
            .header("Range", range.to_string())
            .query(&params);

        let response = self.authorized(request).send().await?;
        let response = Self::check_status(table, response).await?;
        let rows: Vec<Value> = response.json().await?;

        tracing::debug!(
            table = %table,
            range = %range,
            rows = rows.len(),
            store = self.name(),
            "Range query completed"
        );

        Ok(rows)
    }

    async fn predicate_query(&self, table: Table, filters: &[Predicate]) -> AppResult<Vec<Value>> {
        let params = predicate_params(filters);
        let request = self.http_client.get(self.table_url(table)).query(&params);

        let response = self.authorized(request).send().await?;
        let response = Self::check_status(table, response).await?;
        let rows: Vec<Value> = response.json().await?;

        tracing::debug!(
            table = %table,
            predicates = filters.len(),
            rows = rows.len(),
            store = self.name(),
            "Predicate query completed"
        );

        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "postgrest"
    }
}
