//! Downstream subscriber WebSocket endpoint: one axum handler per
//! connection, splitting the socket into an outbound publisher task and
//! an inbound command-handling loop.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use l3_engine::{SubscriberCommand, SubscriberResponse};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::controller::Controller;
use crate::precision::PrecisionCache;
use crate::publisher;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub precision: Arc<PrecisionCache>,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(32);

    let forward = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    let publish = tokio::spawn(publisher::run(state.controller.clone(), outbound_tx.clone()));

    while let Some(msg) = stream.next().await {
        let Ok(msg) = msg else { break };
        let Message::Text(text) = msg else { continue };

        let response = match serde_json::from_str::<SubscriberCommand>(&text) {
            Ok(cmd) => handle_command(&state, cmd).await,
            Err(e) => SubscriberResponse::Error {
                message: format!("invalid command: {e}"),
            },
        };

        let Ok(payload) = serde_json::to_string(&response) else {
            continue;
        };
        if outbound_tx.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }

    publish.abort();
    forward.abort();
    info!("subscriber connection closed");
}

async fn handle_command(state: &AppState, cmd: SubscriberCommand) -> SubscriberResponse {
    match cmd {
        SubscriberCommand::SwitchSymbol { symbol } => {
            state.controller.switch_symbol(&symbol).await;
            SubscriberResponse::SymbolSwitched {
                symbol: state.controller.current_symbol().await,
            }
        }
        SubscriberCommand::ToggleKmeans { enabled } => {
            // No book-shaping behavior hangs off this yet; acknowledged
            // for collaborator parity only.
            SubscriberResponse::KmeansToggled { enabled }
        }
        SubscriberCommand::RefreshPrecision => {
            let symbol = state.controller.current_symbol().await;
            match state.precision.refresh(&symbol).await {
                Ok(_) => SubscriberResponse::PrecisionRefreshed { symbol },
                Err(e) => {
                    warn!(symbol, error = %e, "precision refresh failed");
                    SubscriberResponse::Error {
                        message: format!("precision refresh failed: {e}"),
                    }
                }
            }
        }
    }
}
