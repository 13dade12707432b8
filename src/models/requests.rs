//! Request DTOs for the query service API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::collections::HashSet;

use serde::Deserialize;

use crate::query::{ApiItem, QuerySpec};

/// Longest accepted free-text query, in characters.
pub const MAX_QUERY_LENGTH: usize = 256;

/// Request body for replacing the item set (PUT /items)
///
/// # Fields
/// - `items`: The full list of operations produced by the document parser
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsRequest {
    pub items: Vec<ApiItem>,
}

impl ItemsRequest {
    /// Validates the request.
    ///
    /// # Returns
    /// - `None` if valid
    /// - `Some(error_message)` if invalid
    pub fn validate(&self) -> Option<String> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.id.trim().is_empty() {
                return Some("Item id cannot be empty".to_string());
            }
            if !item.path.starts_with('/') {
                return Some(format!("Item '{}' path must start with '/'", item.id));
            }
            if !seen.insert(item.id.as_str()) {
                return Some(format!("Duplicate item id '{}'", item.id));
            }
        }
        None
    }
}

/// Request body for running a query (POST /query and live frames)
///
/// Every field is optional; an empty object queries everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(flatten)]
    pub spec: QuerySpec,
}

impl QueryRequest {
    pub fn validate(&self) -> Option<String> {
        if self.spec.filter.query.chars().count() > MAX_QUERY_LENGTH {
            return Some(format!(
                "Query exceeds maximum length of {} characters",
                MAX_QUERY_LENGTH
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{GroupBy, HttpMethod};

    #[test]
    fn test_items_request_deserialize() {
        let json = r#"{"items":[{"id":"a","method":"GET","path":"/pets","tags":["pets"]}]}"#;
        let req: ItemsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].method, HttpMethod::Get);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_items_request_rejects_duplicates() {
        let req = ItemsRequest {
            items: vec![
                ApiItem::new("a", HttpMethod::Get, "/a"),
                ApiItem::new("a", HttpMethod::Post, "/a"),
            ],
        };
        assert!(req.validate().unwrap().contains("Duplicate"));
    }

    #[test]
    fn test_items_request_rejects_bad_path() {
        let req = ItemsRequest {
            items: vec![ApiItem::new("a", HttpMethod::Get, "pets")],
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_query_request_flattens_spec() {
        let json = r#"{"filter":{"query":"pet"},"group":{"by":"method"}}"#;
        let req: QueryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.spec.filter.query, "pet");
        assert_eq!(req.spec.group.by, GroupBy::Method);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_query_request_too_long() {
        let mut req = QueryRequest::default();
        req.spec.filter.query = "x".repeat(MAX_QUERY_LENGTH + 1);
        assert!(req.validate().is_some());
    }
}
