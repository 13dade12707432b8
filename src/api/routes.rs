//! API Routes
//!
//! Configures the Axum router with all query service endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, invalidate_handler, put_items_handler, query_handler, report_handler,
    stats_handler, AppState,
};
use super::live::live_handler;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /items` - Replace the item set
/// - `POST /query` - Run a search/filter/sort/group query
/// - `POST /invalidate/:tag` - Drop cached results depending on a tag
/// - `GET /stats` - Per-pool cache statistics
/// - `GET /report` - Performance report with recommendations
/// - `GET /live` - WebSocket for debounced live queries
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/items", put(put_items_handler))
        .route("/query", post(query_handler))
        .route("/invalidate/:tag", post(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/report", get(report_handler))
        .route("/live", get(live_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
