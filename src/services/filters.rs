use std::collections::HashSet;

use crate::{
    models::{ActiveFilter, CatalogItem, FilterCriteria, GenreId},
    services::availability::AvailabilityResolver,
};

/// Ordered filter stages over a catalog snapshot
///
/// Stages run in [`ActiveFilter`] order and only for criteria that differ from their
/// defaults. Every stage keeps or drops items; none reorders. The provider stage is the
/// only one that needs the remote store and runs last, over the already narrowed list.
#[derive(Clone)]
pub struct FilterPipeline {
    resolver: AvailabilityResolver,
}

impl FilterPipeline {
    pub fn new(resolver: AvailabilityResolver) -> Self {
        Self { resolver }
    }

    pub async fn apply(&self, items: &[CatalogItem], criteria: &FilterCriteria) -> Vec<CatalogItem> {
        let active = criteria.active_filters();
        let mut filtered = items.to_vec();

        for stage in &active {
            let before = filtered.len();
            filtered = match LocalStage::try_from(*stage) {
                Ok(local) => apply_local_stage(local, filtered, criteria),
                Err(_) => {
                    self.resolver
                        .filter_by_providers(
                            &filtered,
                            &criteria.provider_ids,
                            criteria.provider_mode,
                            &criteria.region,
                        )
                        .await
                }
            };

            tracing::debug!(stage = ?stage, before, after = filtered.len(), "Filter stage applied");

            if filtered.is_empty() {
                break;
            }
        }

        tracing::info!(
            input = items.len(),
            output = filtered.len(),
            stages = active.len(),
            "Filters applied"
        );

        filtered
    }
}

/// A stage evaluated in memory; every stage except the provider join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalStage {
    MediaKind,
    Genres,
    YearRange,
    MinRating,
    Languages,
    MinVoteCount,
}

impl LocalStage {
    pub fn filter(self) -> ActiveFilter {
        match self {
            LocalStage::MediaKind => ActiveFilter::MediaKind,
            LocalStage::Genres => ActiveFilter::Genres,
            LocalStage::YearRange => ActiveFilter::YearRange,
            LocalStage::MinRating => ActiveFilter::MinRating,
            LocalStage::Languages => ActiveFilter::Languages,
            LocalStage::MinVoteCount => ActiveFilter::MinVoteCount,
        }
    }
}

impl TryFrom<ActiveFilter> for LocalStage {
    /// The filter back, when it needs the remote store
    type Error = ActiveFilter;

    fn try_from(filter: ActiveFilter) -> Result<Self, Self::Error> {
        match filter {
            ActiveFilter::MediaKind => Ok(LocalStage::MediaKind),
            ActiveFilter::Genres => Ok(LocalStage::Genres),
            ActiveFilter::YearRange => Ok(LocalStage::YearRange),
            ActiveFilter::MinRating => Ok(LocalStage::MinRating),
            ActiveFilter::Languages => Ok(LocalStage::Languages),
            ActiveFilter::MinVoteCount => Ok(LocalStage::MinVoteCount),
            ActiveFilter::Providers => Err(filter),
        }
    }
}

/// Runs one in-memory stage.
///
/// Takes ownership of the working copy and narrows it in place. A stage whose criterion
/// is at its default returns the items untouched.
pub fn apply_local_stage(
    stage: LocalStage,
    mut items: Vec<CatalogItem>,
    criteria: &FilterCriteria,
) -> Vec<CatalogItem> {
    if !criteria.is_active(stage.filter()) {
        return items;
    }

    match stage {
        LocalStage::MediaKind => {
            items.retain(|item| criteria.media_kind.matches(item.media_kind));
        }
        LocalStage::Genres => {
            let wanted: HashSet<GenreId> = criteria.genre_ids.iter().copied().collect();
            items.retain(|item| item.genre_ids.iter().any(|genre| wanted.contains(genre)));
        }
        LocalStage::YearRange => {
            // Items without a usable release date cannot be placed in a narrowed window.
            items.retain(|item| {
                item.release_year()
                    .is_some_and(|year| criteria.year_range.contains(year))
            });
        }
        LocalStage::MinRating => {
            items.retain(|item| item.vote_average >= criteria.min_rating);
        }
        LocalStage::Languages => {
            let wanted: HashSet<String> = criteria
                .languages
                .iter()
                .map(|code| code.to_ascii_lowercase())
                .collect();
            items.retain(|item| wanted.contains(&item.original_language.to_ascii_lowercase()));
        }
        LocalStage::MinVoteCount => {
            items.retain(|item| item.vote_count >= criteria.min_vote_count);
        }
    }
    items
}
