#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;

use catalog_discovery::{
    error::{AppError, AppResult},
    store::{
        Column, FilterValue, FilterValues, Predicate, RemoteStore, RowRange, Table, STORE_ROW_CAP,
    },
};

/// In-memory store that enforces the row cap and records the ranges it was asked for
#[derive(Default)]
pub struct MemoryStore {
    pub catalog: Vec<Value>,
    pub availability: Vec<Value>,
    /// Range starts that fail with a transient error
    pub failing_ranges: HashSet<usize>,
    pub fail_predicates: bool,
    pub issued_ranges: Mutex<Vec<RowRange>>,
    pub predicate_calls: Mutex<usize>,
    pub count_calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(catalog: Vec<Value>, availability: Vec<Value>) -> Self {
        Self {
            catalog,
            availability,
            ..Default::default()
        }
    }

    pub fn issued_ranges(&self) -> Vec<RowRange> {
        self.issued_ranges.lock().unwrap().clone()
    }

    pub fn predicate_calls(&self) -> usize {
        *self.predicate_calls.lock().unwrap()
    }

    pub fn count_calls(&self) -> usize {
        *self.count_calls.lock().unwrap()
    }

    fn rows(&self, table: Table) -> &[Value] {
        match table {
            Table::Catalog => &self.catalog,
            Table::ProviderAvailability => &self.availability,
        }
    }
}

fn matches(row: &Value, predicate: &Predicate) -> bool {
    let field = &row[predicate.column().as_str()];
    match predicate {
        Predicate::Eq(_, FilterValue::Int(v)) => field.as_i64() == Some(*v),
        Predicate::Eq(_, FilterValue::Text(v)) => field.as_str() == Some(v.as_str()),
        Predicate::In(_, FilterValues::Ints(vs)) => field.as_i64().is_some_and(|f| vs.contains(&f)),
        Predicate::In(_, FilterValues::Texts(vs)) => {
            field.as_str().is_some_and(|f| vs.iter().any(|v| v == f))
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn count(&self, table: Table) -> AppResult<usize> {
        *self.count_calls.lock().unwrap() += 1;
        // Behave like a remote call: let other tasks run before answering.
        tokio::task::yield_now().await;
        Ok(self.rows(table).len())
    }

    async fn range_query(
        &self,
        table: Table,
        range: RowRange,
        _order_by: &[Column],
    ) -> AppResult<Vec<Value>> {
        self.issued_ranges.lock().unwrap().push(range);
        if self.failing_ranges.contains(&range.start) {
            return Err(AppError::Store(format!("range {} timed out", range)));
        }
        Ok(self
            .rows(table)
            .iter()
            .skip(range.start)
            .take(range.row_count().min(STORE_ROW_CAP))
            .cloned()
            .collect())
    }

    async fn predicate_query(&self, table: Table, filters: &[Predicate]) -> AppResult<Vec<Value>> {
        *self.predicate_calls.lock().unwrap() += 1;
        if self.fail_predicates {
            return Err(AppError::Store("availability join failed".to_string()));
        }
        Ok(self
            .rows(table)
            .iter()
            .filter(|row| filters.iter().all(|p| matches(row, p)))
            .take(STORE_ROW_CAP)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[allow(clippy::too_many_arguments)]
pub fn catalog_row(
    id: i64,
    title: &str,
    kind: &str,
    language: &str,
    popularity: f64,
    rating: f64,
    votes: u32,
    release_date: Option<&str>,
    genres: &[i32],
) -> Value {
    json!({
        "external_id": id,
        "title": title,
        "poster_path": null,
        "backdrop_path": null,
        "overview": "",
        "release_date": release_date,
        "vote_average": rating,
        "vote_count": votes,
        "popularity": popularity,
        "genre_ids": genres,
        "original_language": language,
        "media_kind": kind,
        "cached_at": "2025-01-01T00:00:00Z",
        "updated_at": null,
    })
}

pub fn availability_row(id: i64, kind: &str, provider: i32, region: &str) -> Value {
    json!({
        "external_id": id,
        "media_kind": kind,
        "provider_id": provider,
        "region": region,
    })
}

/// Synthetic catalog of `n` movies with distinct ids `0..n`
pub fn synthetic_catalog(n: usize) -> Vec<Value> {
    (0..n as i64)
        .map(|id| {
            catalog_row(
                id,
                &format!("Synthetic {}", id),
                "movie",
                "en",
                (id % 97) as f64,
                (id % 10) as f64,
                (id * 3) as u32,
                Some("2012-03-04"),
                &[(id % 5) as i32],
            )
        })
        .collect()
}

/// Small mixed catalog used by the discovery tests
pub fn sample_catalog() -> Vec<Value> {
    vec![
        catalog_row(603, "The Matrix", "movie", "en", 83.4, 8.2, 25000, Some("1999-03-30"), &[28, 878]),
        catalog_row(1399, "Game of Thrones", "show", "en", 310.0, 8.4, 24000, Some("2011-04-17"), &[18, 10765]),
        catalog_row(19404, "Dilwale Dulhania Le Jayenge", "movie", "hi", 25.0, 8.5, 4400, Some("1995-10-20"), &[35, 18, 10749]),
        catalog_row(360814, "Dangal", "movie", "hi", 30.0, 8.0, 2000, Some("2016-12-21"), &[18]),
        catalog_row(1008042, "Talk to Me", "movie", "en", 60.0, 7.1, 3000, Some("2023-07-26"), &[27]),
        catalog_row(990001, "Untitled Hindi Project", "movie", "hi", 90.0, 0.0, 0, None, &[]),
        catalog_row(93405, "Squid Game", "show", "ko", 150.0, 7.8, 14000, Some("2021-09-17"), &[10759, 9648, 18]),
        catalog_row(1000001, "Laapataa Ladies", "movie", "hi", 12.0, 8.1, 300, Some("2024-03-01"), &[35, 18]),
    ]
}
