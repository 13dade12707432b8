//! API Module
//!
//! HTTP handlers and routing for the query service REST API.
//!
//! # Endpoints
//! - `PUT /items` - Replace the item set
//! - `POST /query` - Run a query
//! - `POST /invalidate/:tag` - Invalidate cached results by dependency tag
//! - `GET /stats` - Get cache statistics
//! - `GET /report` - Get the performance report
//! - `GET /live` - Live query WebSocket
//! - `GET /health` - Health check endpoint

pub mod handlers;
mod live;
pub mod routes;

pub use handlers::*;
pub use live::live_handler;
pub use routes::create_router;
