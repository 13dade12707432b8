//! apiscope - Adaptive caching and query service for API descriptions
//!
//! Serves search/filter/sort/group queries over a loaded operation list,
//! backed by bounded, strategy-driven cache pools.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apiscope::api::{create_router, AppState};
use apiscope::config::Config;
use apiscope::query::ApiItem;
use apiscope::tasks::spawn_maintenance_task;

/// Main entry point for the query service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the query pipeline and its cache pools
/// 4. Load the initial item list, if configured
/// 5. Start the background cache maintenance task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apiscope=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting apiscope query service");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cleanup_interval={}s, debounce={}ms, offload_threshold={}",
        config.server_port, config.cleanup_interval, config.debounce_ms, config.offload_threshold
    );
    for (name, pool) in [
        ("search", &config.search_pool),
        ("filter", &config.filter_pool),
        ("results", &config.result_pool),
    ] {
        info!(
            "Pool '{}': max_entries={}, max_bytes={}, ttl={}ms, strategy={}",
            name, pool.max_entries, pool.max_bytes, pool.default_ttl_ms, pool.strategy
        );
    }

    // Create application state with the query pipeline
    let state = AppState::from_config(&config);

    if let Some(path) = &config.items_path {
        let items = load_items(path)?;
        state.pipeline.set_items(items);
    }

    // Start background maintenance task
    let maintenance_handle = spawn_maintenance_task(
        state.pipeline.pools(),
        Duration::from_secs(config.cleanup_interval.max(1)),
    );

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(maintenance_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Reads the initial item list from a JSON array file.
fn load_items(path: &Path) -> anyhow::Result<Vec<ApiItem>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read items from {}", path.display()))?;
    let items: Vec<ApiItem> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse items in {}", path.display()))?;
    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the maintenance task and allows graceful
/// shutdown.
async fn shutdown_signal(maintenance_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the maintenance task
    maintenance_handle.abort();
    warn!("Maintenance task aborted");
}
