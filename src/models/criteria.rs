use serde::{Deserialize, Serialize};

use super::{GenreId, MediaKind, ProviderId};
use crate::config::default_region;

pub const DEFAULT_MIN_YEAR: i32 = 1990;
pub const DEFAULT_MAX_YEAR: i32 = 2025;

/// Media kind selector; `All` disables the media-kind stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKindFilter {
    #[default]
    All,
    Movie,
    Show,
}

impl MediaKindFilter {
    pub fn matches(&self, kind: MediaKind) -> bool {
        match self {
            MediaKindFilter::All => true,
            MediaKindFilter::Movie => kind == MediaKind::Movie,
            MediaKindFilter::Show => kind == MediaKind::Show,
        }
    }
}

/// Membership semantics for the provider filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuorumMode {
    /// Offered by at least one of the requested providers
    #[default]
    Any,
    /// Offered by every requested provider
    All,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Popularity,
    Rating,
    ReleaseDate,
    Votes,
}

/// Inclusive release-year window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_YEAR,
            max: DEFAULT_MAX_YEAR,
        }
    }
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// An inverted range contains nothing.
    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }
}

/// A criterion differing from its default, i.e. a filter that narrows results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveFilter {
    MediaKind,
    Genres,
    YearRange,
    MinRating,
    Languages,
    MinVoteCount,
    Providers,
}

impl ActiveFilter {
    /// Stage order of the filter pipeline; the provider join runs last.
    pub const PIPELINE_ORDER: [ActiveFilter; 7] = [
        ActiveFilter::MediaKind,
        ActiveFilter::Genres,
        ActiveFilter::YearRange,
        ActiveFilter::MinRating,
        ActiveFilter::Languages,
        ActiveFilter::MinVoteCount,
        ActiveFilter::Providers,
    ];
}

/// User-specified filter and sort settings for one search action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterCriteria {
    pub media_kind: MediaKindFilter,
    /// Matched with OR semantics
    pub genre_ids: Vec<GenreId>,
    pub year_range: YearRange,
    pub min_rating: f64,
    pub min_vote_count: u32,
    /// ISO 639-1 codes, matched with OR semantics
    pub languages: Vec<String>,
    pub provider_ids: Vec<ProviderId>,
    pub provider_mode: QuorumMode,
    pub region: String,
    pub sort_by: SortKey,
    pub ascending: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            media_kind: MediaKindFilter::All,
            genre_ids: Vec::new(),
            year_range: YearRange::default(),
            min_rating: 0.0,
            min_vote_count: 0,
            languages: Vec::new(),
            provider_ids: Vec::new(),
            provider_mode: QuorumMode::Any,
            region: default_region(),
            sort_by: SortKey::Popularity,
            ascending: false,
        }
    }
}

impl FilterCriteria {
    /// Whether `filter` differs from its default and so narrows results.
    ///
    /// Destructures every field so a new criterion cannot be added without deciding
    /// here whether it narrows results.
    pub fn is_active(&self, filter: ActiveFilter) -> bool {
        let FilterCriteria {
            media_kind,
            genre_ids,
            year_range,
            min_rating,
            min_vote_count,
            languages,
            provider_ids,
            // Modifiers of the provider filter, not filters on their own.
            provider_mode: _,
            region: _,
            sort_by: _,
            ascending: _,
        } = self;

        match filter {
            ActiveFilter::MediaKind => *media_kind != MediaKindFilter::All,
            ActiveFilter::Genres => !genre_ids.is_empty(),
            ActiveFilter::YearRange => !year_range.is_default(),
            ActiveFilter::MinRating => *min_rating > 0.0,
            ActiveFilter::Languages => !languages.is_empty(),
            ActiveFilter::MinVoteCount => *min_vote_count > 0,
            ActiveFilter::Providers => !provider_ids.is_empty(),
        }
    }

    /// Filters that differ from their default, in pipeline order.
    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        ActiveFilter::PIPELINE_ORDER
            .into_iter()
            .filter(|filter| self.is_active(*filter))
            .collect()
    }

    /// True when the language filter is the only criterion narrowing results.
    pub fn is_language_only(&self) -> bool {
        self.active_filters() == [ActiveFilter::Languages]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_criteria_has_no_active_filters() {
        assert!(FilterCriteria::default().active_filters().is_empty());
    }

    #[test]
    fn test_deserialize_partial_criteria_fills_defaults() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"languages":["hi"],"sort_by":"release_date"}"#).unwrap();
        assert_eq!(criteria.languages, vec!["hi".to_string()]);
        assert_eq!(criteria.sort_by, SortKey::ReleaseDate);
        assert_eq!(criteria.year_range, YearRange::default());
        assert_eq!(criteria.region, "US");
        assert_eq!(criteria.provider_mode, QuorumMode::Any);
    }

    #[test]
    fn test_language_only_detection() {
        let criteria = FilterCriteria {
            languages: vec!["hi".to_string()],
            ..Default::default()
        };
        assert!(criteria.is_language_only());
        assert!(!FilterCriteria::default().is_language_only());
    }

    // One case per criterion: any extra active filter must suppress the language-only state.
    #[test]
    fn test_language_only_suppressed_by_each_additional_filter() {
        let base = FilterCriteria {
            languages: vec!["hi".to_string()],
            ..Default::default()
        };

        let variants = vec![
            FilterCriteria {
                media_kind: MediaKindFilter::Movie,
                ..base.clone()
            },
            FilterCriteria {
                genre_ids: vec![18],
                ..base.clone()
            },
            FilterCriteria {
                year_range: YearRange::new(2000, 2025),
                ..base.clone()
            },
            FilterCriteria {
                min_rating: 5.0,
                ..base.clone()
            },
            FilterCriteria {
                min_vote_count: 100,
                ..base.clone()
            },
            FilterCriteria {
                provider_ids: vec![8],
                ..base.clone()
            },
        ];

        for criteria in variants {
            assert!(
                !criteria.is_language_only(),
                "override should be suppressed for {:?}",
                criteria.active_filters()
            );
        }
    }

    #[test]
    fn test_sort_and_region_do_not_count_as_filters() {
        let criteria = FilterCriteria {
            languages: vec!["ko".to_string()],
            region: "KR".to_string(),
            provider_mode: QuorumMode::All,
            sort_by: SortKey::Rating,
            ascending: true,
            ..Default::default()
        };
        assert_eq!(criteria.active_filters(), vec![ActiveFilter::Languages]);
    }

    #[test]
    fn test_active_filters_follow_pipeline_order() {
        let criteria = FilterCriteria {
            provider_ids: vec![8],
            min_vote_count: 10,
            media_kind: MediaKindFilter::Show,
            genre_ids: vec![18],
            ..Default::default()
        };
        assert_eq!(
            criteria.active_filters(),
            vec![
                ActiveFilter::MediaKind,
                ActiveFilter::Genres,
                ActiveFilter::MinVoteCount,
                ActiveFilter::Providers,
            ]
        );
        assert!(criteria.is_active(ActiveFilter::Genres));
        assert!(!criteria.is_active(ActiveFilter::Languages));
    }

    #[test]
    fn test_year_range_contains() {
        let range = YearRange::new(2000, 2010);
        assert!(range.contains(2000));
        assert!(range.contains(2010));
        assert!(!range.contains(2011));
        assert!(!YearRange::new(2010, 2000).contains(2005));
    }
}
