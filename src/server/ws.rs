use crate::errors::PayoffError;
use crate::server::routes::{compute_heatmap, compute_payoff, defaults};
use crate::state::{AppState, RequestCounters, WsMessage, WsRequest};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Turns one inbound text frame into exactly one reply. Validation and parse
/// failures become `error` messages; the connection stays open.
pub fn handle_text(state: &AppState, text: &str) -> WsMessage {
    let request: WsRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            let err = PayoffError::from(e);
            RequestCounters::bump(&state.counters.validation_errors);
            tracing::warn!(error = %err, "unparseable ws message");
            return WsMessage::from(&err);
        }
    };

    let result = match request {
        WsRequest::Payoff(req) => compute_payoff(state, &req).map(WsMessage::PayoffResult),
        WsRequest::Heatmap(req) => compute_heatmap(state, &req).map(WsMessage::HeatmapResult),
    };
    result.unwrap_or_else(|e| WsMessage::from(&e))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    RequestCounters::bump(&state.counters.ws_connections);
    tracing::debug!("ws client connected");

    // Send an initial render from the default inputs
    let initial = compute_payoff(&state, &defaults(&state).payoff)
        .map(WsMessage::PayoffResult)
        .unwrap_or_else(|e| WsMessage::from(&e));
    if send(&mut sender, &state, &initial).await.is_err() {
        return;
    }

    // Requests are handled in arrival order; each reply supersedes the last
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = handle_text(&state, text.as_str());
                if send(&mut sender, &state, &reply).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {} // Ignore binary / ping / pong
        }
    }

    tracing::debug!("ws client disconnected");
}

async fn send<S>(sender: &mut S, state: &AppState, msg: &WsMessage) -> Result<(), ()>
where
    S: futures_util::Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!("ws serialize error: {e}");
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await.map_err(|_| ())?;
    RequestCounters::bump(&state.counters.ws_messages_sent);
    Ok(())
}
