use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod criteria;

pub use criteria::{
    ActiveFilter, FilterCriteria, MediaKindFilter, QuorumMode, SortKey, YearRange,
    DEFAULT_MAX_YEAR, DEFAULT_MIN_YEAR,
};

/// Genre identifier as assigned by the upstream metadata provider
pub type GenreId = i32;

/// Streaming provider identifier as assigned by the upstream metadata provider
pub type ProviderId = i32;

/// Kind of media a catalog record describes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a catalog record: the external id alone is not unique across media kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub external_id: i64,
    pub media_kind: MediaKind,
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.media_kind, self.external_id)
    }
}

/// A cached movie or show record replicated from the remote store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub external_id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    /// Raw release (or first air) date, "YYYY-MM-DD"
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub original_language: String,
    pub media_kind: MediaKind,
    #[serde(default)]
    pub cached_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogItem {
    pub fn key(&self) -> ItemKey {
        ItemKey {
            external_id: self.external_id,
            media_kind: self.media_kind,
        }
    }

    /// Parsed release date; empty or malformed values count as missing.
    pub fn parsed_release_date(&self) -> Option<NaiveDate> {
        let raw = self.release_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    pub fn release_year(&self) -> Option<i32> {
        self.parsed_release_date().map(|date| date.year())
    }
}

/// One row of the provider availability relation: item is offered by provider in region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderAvailability {
    pub external_id: i64,
    pub media_kind: MediaKind,
    pub provider_id: ProviderId,
    pub region: String,
}

impl ProviderAvailability {
    pub fn item_key(&self) -> ItemKey {
        ItemKey {
            external_id: self.external_id,
            media_kind: self.media_kind,
        }
    }
}

/// Items in final display order after filtering and sorting
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedResult {
    pub items: Vec<CatalogItem>,
    /// Sort key actually applied, which differs from the requested one when the
    /// language-only override kicks in
    pub sort_by: SortKey,
    pub ascending: bool,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
