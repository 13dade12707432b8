//! Live Query WebSocket
//!
//! Clients send a query frame on every keystroke or filter toggle; each
//! connection owns one [`LiveQuery`], so only the last frame of a burst is
//! computed and pushed back.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::handlers::AppState;
use crate::error::AppError;
use crate::models::{ErrorResponse, QueryRequest};
use crate::query::{LiveQuery, LiveUpdate};

/// WebSocket upgrade handler for GET /live.
pub async fn live_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_live_client(socket, state))
}

async fn handle_live_client(socket: WebSocket, state: AppState) {
    let live = LiveQuery::new(
        state.next_live_key(),
        Arc::clone(&state.pipeline),
        state.scheduler.clone(),
        state.debounce_delay,
    )
    .with_backend(Arc::clone(&state.backend), state.compute_timeout);
    debug!("Live client '{}' connected", live.key());

    let mut rx = live.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let client = live.key().to_string();
    let push = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let json = encode_update(&client, &update);
                    if sender.send(Message::Text(json)).await.is_err() {
                        break; // Client disconnected
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<QueryRequest>(&text) {
                Ok(req) => match req.validate() {
                    None => live.submit(req.spec),
                    Some(error_msg) => debug!("Rejected live query frame: {}", error_msg),
                },
                Err(e) => debug!("Ignoring malformed live query frame: {}", e),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    push.abort();
    debug!("Live client '{}' disconnected", live.key());
}

/// Renders one update as a text frame: the query result, or an error body
/// shaped like the HTTP error responses.
fn encode_update(client: &str, update: &LiveUpdate) -> String {
    let encoded = match update {
        Ok(result) => serde_json::to_string(&**result).map_err(|e| {
            AppError::Internal(format!("could not encode live result: {}", e))
        }),
        Err(e) => Err(AppError::from(e.clone())),
    };

    encoded.unwrap_or_else(|error| {
        warn!("Live client '{}': {}", client, error);
        serde_json::to_string(&ErrorResponse::new(error.to_string()))
            .unwrap_or_else(|_| r#"{"error":"Internal error"}"#.to_string())
    })
}
