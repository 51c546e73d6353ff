use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use meshroom_core::{ConnId, ServerEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct SignalingInner {
    peers: DashMap<ConnId, mpsc::UnboundedSender<Message>>,
}

/// Table of live WebSocket writers, keyed by the connection's identifier.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
        }
    }

    pub fn add_peer(&self, conn_id: ConnId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(conn_id, tx);
    }

    pub fn remove_peer(&self, conn_id: &ConnId) {
        self.inner.peers.remove(conn_id);
    }

    pub fn send_envelope(&self, conn_id: &ConnId, envelope: &ServerEnvelope) {
        let Some(peer) = self.inner.peers.get(conn_id) else {
            debug!(%conn_id, "Dropping frame for disconnected connection");
            return;
        };

        match serde_json::to_string(envelope) {
            Ok(json) => {
                if peer.send(Message::Text(json.into())).is_err() {
                    debug!(%conn_id, "WebSocket writer already closed");
                }
            }
            Err(e) => error!("Failed to serialize server envelope: {}", e),
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, conn_id: &ConnId, envelope: ServerEnvelope) {
        self.send_envelope(conn_id, &envelope);
    }
}
