//! Remote store accessor
//!
//! Thin query interface over the backing store that holds the replicated catalog and the
//! provider availability relation. The store answers at most [`STORE_ROW_CAP`] rows per
//! request; callers that need more must page (the bulk loader) or bound their predicates
//! (the availability resolver).

use serde_json::Value;
use std::fmt::Display;

use crate::error::AppResult;

pub mod postgres;
pub mod postgrest;

pub use postgres::PgStore;
pub use postgrest::PostgrestStore;

/// Maximum number of rows the store returns for a single request
pub const STORE_ROW_CAP: usize = 1000;

/// Tables the engine reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Cached movie and show records
    Catalog,
    /// (item, provider, region) availability rows
    ProviderAvailability,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Catalog => "media_catalog",
            Table::ProviderAvailability => "provider_availability",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns usable in ordering and predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ExternalId,
    MediaKind,
    ProviderId,
    Region,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::ExternalId => "external_id",
            Column::MediaKind => "media_kind",
            Column::ProviderId => "provider_id",
            Column::Region => "region",
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive, zero-based row window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    /// Window of `size` rows beginning at `start`.
    pub fn starting_at(start: usize, size: usize) -> Self {
        Self {
            start,
            end: start + size.max(1) - 1,
        }
    }

    pub fn row_count(&self) -> usize {
        self.end - self.start + 1
    }
}

impl Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Int(v) => write!(f, "{}", v),
            FilterValue::Text(v) => f.write_str(v),
        }
    }
}

/// Homogeneous value list for set membership predicates
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValues {
    Ints(Vec<i64>),
    Texts(Vec<String>),
}

impl FilterValues {
    pub fn len(&self) -> usize {
        match self {
            FilterValues::Ints(values) => values.len(),
            FilterValues::Texts(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single conjunctive condition in a predicate query
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Column, FilterValue),
    In(Column, FilterValues),
}

impl Predicate {
    pub fn column(&self) -> Column {
        match self {
            Predicate::Eq(column, _) | Predicate::In(column, _) => *column,
        }
    }
}

/// Query interface to the backing store
///
/// Implementations return rows as JSON objects keyed by column name and never return more
/// than [`STORE_ROW_CAP`] rows from one call. Errors are surfaced as-is; retry and fallback
/// policy belongs to the callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Total number of rows in `table`
    async fn count(&self, table: Table) -> AppResult<usize>;

    /// Rows `[range.start, range.end]` of `table` in `order_by` order
    async fn range_query(
        &self,
        table: Table,
        range: RowRange,
        order_by: &[Column],
    ) -> AppResult<Vec<Value>>;

    /// Rows of `table` matching every predicate
    async fn predicate_query(&self, table: Table, filters: &[Predicate]) -> AppResult<Vec<Value>>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}
