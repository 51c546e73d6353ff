use crate::app::AppState;
use crate::room::RelayCommand;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use meshroom_core::{ClientEnvelope, ConnId, ServerEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = ConnId::generate();
    info!(%conn_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.signaling.add_peer(conn_id.clone(), tx);
    state.signaling.send_envelope(
        &conn_id,
        &ServerEnvelope::Welcome {
            socket_id: conn_id.clone(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let state = state.clone();
        let conn_id = conn_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEnvelope>(&text) {
                        Ok(envelope) => {
                            let cmd = RelayCommand::Inbound {
                                conn_id: conn_id.clone(),
                                envelope,
                            };
                            if let Err(e) = state.relay_tx.send(cmd).await {
                                error!("Relay died: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(%conn_id, "Invalid frame: {}", e);
                            state.signaling.send_envelope(
                                &conn_id,
                                &ServerEnvelope::Error {
                                    message: format!("invalid frame: {e}"),
                                },
                            );
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.signaling.remove_peer(&conn_id);
    let _ = state
        .relay_tx
        .send(RelayCommand::Disconnect {
            conn_id: conn_id.clone(),
        })
        .await;
    info!(%conn_id, "WebSocket disconnected");
}
