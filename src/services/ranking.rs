use std::cmp::Ordering;

use crate::models::{CatalogItem, FilterCriteria, SortKey};

/// Sort key and direction actually applied for `criteria`.
///
/// A query whose only active filter is the language filter and whose requested key is
/// popularity is sorted newest-first instead. Any other active filter suppresses this.
pub fn effective_sort(criteria: &FilterCriteria) -> (SortKey, bool) {
    if criteria.sort_by == SortKey::Popularity && criteria.is_language_only() {
        tracing::debug!(
            languages = ?criteria.languages,
            "Language-only query, sorting by release date"
        );
        return (SortKey::ReleaseDate, false);
    }
    (criteria.sort_by, criteria.ascending)
}

/// Comparison in ascending order of `key`; missing release dates sort earliest.
fn compare(a: &CatalogItem, b: &CatalogItem, key: SortKey) -> Ordering {
    match key {
        SortKey::Popularity => a.popularity.total_cmp(&b.popularity),
        SortKey::Rating => a.vote_average.total_cmp(&b.vote_average),
        SortKey::Votes => a.vote_count.cmp(&b.vote_count),
        // None < Some(_)
        SortKey::ReleaseDate => a.parsed_release_date().cmp(&b.parsed_release_date()),
    }
}

/// Returns a sorted copy of `items`; `ascending = false` puts the highest values first.
///
/// Stable, so ties keep their filtered order.
pub fn sort(items: &[CatalogItem], key: SortKey, ascending: bool) -> Vec<CatalogItem> {
    let mut sorted = items.to_vec();
    if key == SortKey::ReleaseDate {
        // Parse each date once rather than on every comparison.
        let mut keyed: Vec<_> = sorted
            .into_iter()
            .map(|item| (item.parsed_release_date(), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.cmp(b);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        return keyed.into_iter().map(|(_, item)| item).collect();
    }

    sorted.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    sorted
}
