//! Response DTOs for the query service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::query::QueryResult;

/// Response body for PUT /items
#[derive(Debug, Clone, Serialize)]
pub struct ItemsResponse {
    pub message: String,
    pub count: usize,
    pub generation: u64,
}

impl ItemsResponse {
    pub fn new(count: usize, generation: u64) -> Self {
        Self {
            message: format!("Loaded {} items", count),
            count,
            generation,
        }
    }
}

/// Response body for POST /query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub result: QueryResult,
    /// Wall time spent answering, in milliseconds
    pub took_ms: f64,
}

/// Response body for POST /invalidate/:tag
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub tag: String,
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(tag: impl Into<String>, removed: usize) -> Self {
        let tag = tag.into();
        Self {
            message: format!("Invalidated {} entries tagged '{}'", removed, tag),
            tag,
            removed,
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub items: usize,
    pub generation: u64,
    /// Live queries waiting for their quiet period
    pub pending_recomputations: usize,
    pub pools: BTreeMap<String, CacheStats>,
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_response_serialize() {
        let json = serde_json::to_string(&ItemsResponse::new(3, 2)).unwrap();
        assert!(json.contains("Loaded 3 items"));
        assert!(json.contains("\"generation\":2"));
    }

    #[test]
    fn test_query_response_flattens_result() {
        let resp = QueryResponse {
            result: QueryResult {
                filtered_items: Vec::new(),
                grouped_items: BTreeMap::new(),
                total_filtered: 0,
                generation: 1,
            },
            took_ms: 0.5,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["total_filtered"], 0);
        assert_eq!(json["took_ms"], 0.5);
    }

    #[test]
    fn test_invalidate_response_serialize() {
        let json = serde_json::to_string(&InvalidateResponse::new("items", 4)).unwrap();
        assert!(json.contains("Invalidated 4 entries tagged 'items'"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
