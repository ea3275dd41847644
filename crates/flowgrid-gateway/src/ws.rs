//! Status channel WebSocket: forwards a run's status events to a subscriber
//!
//! Per-subscriber FIFO comes from the broadcast topic; a lagged client is
//! told how many events it dropped (at-least-once, not exactly-once).

use axum::extract::ws::{Message as WsMessage, WebSocket};
use flowgrid_core::{RunId, StatusBus};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub async fn stream_status(socket: WebSocket, bus: &StatusBus, run_id: RunId) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut status_rx = bus.subscribe(&run_id);

    loop {
        tokio::select! {
            event = status_rx.recv() => {
                match event {
                    Ok(event) => {
                        if let Ok(text) = serde_json::to_string(&event) {
                            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                                return; // Client disconnected
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(run = %run_id, dropped = n, "status subscriber lagged");
                        let notice = json!({"lagged": n}).to_string();
                        if ws_tx.send(WsMessage::Text(notice)).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(run = %run_id, "status topic closed");
                        let _ = ws_tx.send(WsMessage::Close(None)).await;
                        return;
                    }
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(WsMessage::Close(_))) | None => {
                        debug!(run = %run_id, "status subscriber left");
                        return;
                    }
                    Some(Ok(_)) => {} // Subscribers only listen.
                    Some(Err(e)) => {
                        warn!(run = %run_id, "websocket error: {e}");
                        return;
                    }
                }
            }
        }
    }
}
