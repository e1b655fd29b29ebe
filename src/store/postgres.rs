//! Direct PostgreSQL store
//!
//! Rows are returned via `row_to_json` so both store implementations hand callers the same
//! JSON shape. Every read is capped at [`STORE_ROW_CAP`] to match the hosted store's limit.
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use std::time::Duration;

use crate::{
    error::AppResult,
    store::{
        Column, FilterValue, FilterValues, Predicate, RemoteStore, RowRange, Table, STORE_ROW_CAP,
    },
};

/// Creates a PostgreSQL connection pool
///
/// `timeout` bounds both connection acquisition and, via `statement_timeout`, each query.
pub async fn create_pool(database_url: &str, timeout: Duration) -> anyhow::Result<PgPool> {
    let statement_timeout = format!("SET statement_timeout = {}", timeout.as_millis());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(timeout)
        .after_connect(move |conn, _meta| {
            let statement_timeout = statement_timeout.clone();
            Box::pin(async move {
                sqlx::query(&statement_timeout).execute(conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(order_by: &[Column]) -> String {
    if order_by.is_empty() {
        return String::new();
    }
    let columns = order_by
        .iter()
        .map(|column| format!("t.{} ASC", column))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ORDER BY {}", columns)
}

/// Builds the SELECT for a predicate read; identifiers come from closed enums, values are bound.
fn predicate_select(table: Table, filters: &[Predicate]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT row_to_json(t)::jsonb FROM {} t", table));

    for (index, predicate) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        builder.push(format!("t.{}", predicate.column()));

        match predicate {
            Predicate::Eq(_, FilterValue::Int(value)) => {
                builder.push(" = ").push_bind(*value);
            }
            Predicate::Eq(_, FilterValue::Text(value)) => {
                builder.push(" = ").push_bind(value.clone());
            }
            Predicate::In(_, FilterValues::Ints(values)) => {
                builder.push(" = ANY(").push_bind(values.clone()).push(")");
            }
            Predicate::In(_, FilterValues::Texts(values)) => {
                builder.push(" = ANY(").push_bind(values.clone()).push(")");
            }
        }
    }

    builder.push(format!(" LIMIT {}", STORE_ROW_CAP));
    builder
}

#[async_trait]
impl RemoteStore for PgStore {
    async fn count(&self, table: Table) -> AppResult<usize> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(table = %table, total, store = self.name(), "Row count fetched");

        Ok(total.max(0) as usize)
    }

    async fn range_query(
        &self,
        table: Table,
        range: RowRange,
        order_by: &[Column],
    ) -> AppResult<Vec<Value>> {
        let sql = format!(
            "SELECT row_to_json(t)::jsonb FROM {} t{} OFFSET $1 LIMIT $2",
            table,
            order_clause(order_by)
        );
        let limit = range.row_count().min(STORE_ROW_CAP);

        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(range.start as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

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
        let mut builder = predicate_select(table, filters);
        let rows: Vec<Value> = builder.build_query_scalar().fetch_all(&self.pool).await?;

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
        "postgres"
    }
}
