//! Search Stage
//!
//! Case-insensitive fuzzy text search. Every whitespace-separated term must
//! match at least one searched field; the item score is the sum of each
//! term's best weighted field score.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::query::item::ApiItem;
use crate::query::spec::SearchField;

const EXACT_SCORE: u32 = 100;
const PREFIX_SCORE: u32 = 75;
const SUBSTRING_SCORE: u32 = 50;
const SUBSEQUENCE_MAX_SCORE: u32 = 25;

/// Input of one search call; also the request sent to an offloaded backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub fields: BTreeSet<SearchField>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, fields: BTreeSet<SearchField>) -> Self {
        Self {
            query: query.into(),
            fields,
        }
    }

    fn terms(&self) -> Vec<String> {
        self.query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}

fn field_weight(field: SearchField) -> u32 {
    match field {
        SearchField::Path | SearchField::Summary => 3,
        SearchField::OperationId | SearchField::Tags | SearchField::Method => 2,
        SearchField::Description => 1,
    }
}

// == Search ==
/// Returns indices of matching items, best match first. Equal scores keep
/// input order. An empty query returns every index in input order.
pub fn search(items: &[ApiItem], request: &SearchRequest) -> Vec<usize> {
    let terms = request.terms();
    if terms.is_empty() {
        return (0..items.len()).collect();
    }

    let mut scored: Vec<(usize, u32)> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            score_item(item, &terms, &request.fields).map(|score| (index, score))
        })
        .collect();

    // Stable: ties stay in input order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(index, _)| index).collect()
}

/// Total score of `item`, or `None` if some term matches no field.
pub fn score_item(item: &ApiItem, terms: &[String], fields: &BTreeSet<SearchField>) -> Option<u32> {
    let haystacks: Vec<(SearchField, String)> = fields
        .iter()
        .flat_map(|field| field_values(item, *field).into_iter().map(move |v| (*field, v)))
        .collect();

    let mut total = 0;
    for term in terms {
        let best = haystacks
            .iter()
            .filter_map(|(field, value)| {
                match_score(term, value, *field != SearchField::Description)
                    .map(|score| score * field_weight(*field))
            })
            .max()?;
        total += best;
    }
    Some(total)
}

fn field_values(item: &ApiItem, field: SearchField) -> Vec<String> {
    match field {
        SearchField::Path => vec![item.path.to_lowercase()],
        SearchField::Summary => vec![item.summary.to_lowercase()],
        SearchField::Description => vec![item.description.to_lowercase()],
        SearchField::OperationId => item
            .operation_id
            .iter()
            .map(|id| id.to_lowercase())
            .collect(),
        SearchField::Tags => item.tags.iter().map(|tag| tag.to_lowercase()).collect(),
        SearchField::Method => vec![item.method.as_str().to_lowercase()],
    }
}

/// Scores one lowercase term against one lowercase value.
fn match_score(term: &str, value: &str, allow_subsequence: bool) -> Option<u32> {
    if value.is_empty() {
        return None;
    }
    if value == term {
        Some(EXACT_SCORE)
    } else if value.starts_with(term) {
        Some(PREFIX_SCORE)
    } else if value.contains(term) {
        Some(SUBSTRING_SCORE)
    } else if allow_subsequence {
        subsequence_score(term, value)
    } else {
        None
    }
}

/// Scores an in-order but scattered match; tighter spans score higher.
fn subsequence_score(term: &str, value: &str) -> Option<u32> {
    let mut needle = term.chars().peekable();
    let mut first = None;
    let mut last = 0;

    for (position, ch) in value.chars().enumerate() {
        match needle.peek() {
            Some(&wanted) if wanted == ch => {
                first.get_or_insert(position);
                last = position;
                needle.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    if needle.peek().is_some() {
        return None;
    }
    let span = last - first? + 1;
    let matched = term.chars().count() as u32;
    Some((SUBSEQUENCE_MAX_SCORE * matched / span as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::item::HttpMethod;

    fn items() -> Vec<ApiItem> {
        vec![
            ApiItem::new("0", HttpMethod::Get, "/pets")
                .with_summary("List pets")
                .with_tags(["pets"]),
            ApiItem::new("1", HttpMethod::Get, "/users/{id}")
                .with_summary("Get a user")
                .with_description("Returns the user with its pets")
                .with_tags(["users"]),
            ApiItem::new("2", HttpMethod::Post, "/users")
                .with_summary("Create user")
                .with_tags(["users"]),
            ApiItem::new("3", HttpMethod::Delete, "/stores/{id}").with_summary("Delete store"),
        ]
    }

    fn request(query: &str) -> SearchRequest {
        SearchRequest::new(query, SearchField::defaults())
    }

    #[test]
    fn test_empty_query_passes_everything() {
        assert_eq!(search(&items(), &request("   ")), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_case_insensitive_partial_match() {
        let found = search(&items(), &request("USER"));
        assert_eq!(found.len(), 2);
        assert!(found.contains(&1) && found.contains(&2));
    }

    #[test]
    fn test_ranking_prefers_stronger_matches() {
        // "/pets" path prefix + exact tag beats a description mention
        let found = search(&items(), &request("pets"));
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_all_terms_must_match() {
        assert_eq!(search(&items(), &request("create user")), vec![2]);
        assert!(search(&items(), &request("create store")).is_empty());
    }

    #[test]
    fn test_subsequence_match() {
        // "dlst" is a scattered match of "delete store"
        assert_eq!(search(&items(), &request("dlst")), vec![3]);
    }

    #[test]
    fn test_subsequence_not_applied_to_description() {
        let items = vec![ApiItem::new("0", HttpMethod::Get, "/a").with_description("xyz")];
        let fields: BTreeSet<_> = [SearchField::Description].into_iter().collect();
        assert!(search(&items, &SearchRequest::new("xz", fields.clone())).is_empty());
        assert_eq!(search(&items, &SearchRequest::new("yz", fields)), vec![0]);
    }

    #[test]
    fn test_field_selection() {
        let fields: BTreeSet<_> = [SearchField::Method].into_iter().collect();
        assert_eq!(search(&items(), &SearchRequest::new("post", fields)), vec![2]);
        // Method is not searched by default
        assert!(search(&items(), &request("post")).is_empty());
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let items: Vec<ApiItem> = (0..5)
            .map(|i| ApiItem::new(i.to_string(), HttpMethod::Get, "/same").with_summary("same"))
            .collect();
        assert_eq!(search(&items, &request("same")), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_subsequence_score_tightness() {
        assert_eq!(subsequence_score("abc", "abc"), Some(25));
        assert!(subsequence_score("ac", "abc").unwrap() < 25);
        assert_eq!(subsequence_score("ca", "abc"), None);
    }
}
