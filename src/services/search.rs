use crate::models::CatalogItem;

/// Queries shorter than this (in characters) leave the list untouched
pub const MIN_QUERY_CHARS: usize = 2;

/// Case-insensitive substring match on titles.
///
/// Independent of the filter pipeline; callers decide whether to compose the two.
pub fn quick_search(items: &[CatalogItem], query: &str) -> Vec<CatalogItem> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return items.to_vec();
    }

    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn titled(id: i64, title: &str) -> CatalogItem {
        CatalogItem {
            external_id: id,
            title: title.to_string(),
            poster_path: None,
            backdrop_path: None,
            overview: "matrix appears only in this overview".to_string(),
            release_date: None,
            vote_average: 0.0,
            vote_count: 0,
            popularity: 0.0,
            genre_ids: vec![],
            original_language: "en".to_string(),
            media_kind: MediaKind::Movie,
            cached_at: None,
            updated_at: None,
        }
    }

    fn catalog() -> Vec<CatalogItem> {
        vec![
            titled(603, "The Matrix"),
            titled(604, "The Matrix Reloaded"),
            titled(11, "Star Wars"),
            titled(12, "Mad Max"),
        ]
    }

    #[test]
    fn test_short_query_returns_input_unchanged() {
        let items = catalog();
        assert_eq!(quick_search(&items, "m"), items);
        assert_eq!(quick_search(&items, ""), items);
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let result = quick_search(&catalog(), "mat");
        let ids: Vec<i64> = result.iter().map(|i| i.external_id).collect();
        assert_eq!(ids, vec![603, 604]);

        let result = quick_search(&catalog(), "MATRIX R");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "The Matrix Reloaded");
    }

    #[test]
    fn test_overview_is_not_searched() {
        assert!(quick_search(&catalog(), "overview").is_empty());
    }

    #[test]
    fn test_multibyte_single_char_is_too_short() {
        let items = vec![titled(1, "Élite")];
        assert_eq!(quick_search(&items, "É"), items);
        assert_eq!(quick_search(&items, "éL").len(), 1);
    }
}
