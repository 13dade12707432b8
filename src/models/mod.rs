//! Request and Response models for the query service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ItemsRequest, QueryRequest, MAX_QUERY_LENGTH};
pub use responses::{
    ErrorResponse, HealthResponse, InvalidateResponse, ItemsResponse, QueryResponse,
    StatsResponse,
};
