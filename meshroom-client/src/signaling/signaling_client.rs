use crate::error::MeshError;
use crate::transport::SignalSink;
use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use meshroom_core::{ClientEnvelope, ConnId, ServerEnvelope};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const WELCOME_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket connection to the relay.
///
/// Construct one per session with [`SignalingClient::connect`] and hand it to
/// the mesh manager as its [`SignalSink`].
pub struct SignalingClient {
    local_id: ConnId,
    outbound: mpsc::UnboundedSender<Message>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl SignalingClient {
    /// Connects, waits for the relay's welcome frame and starts the reader
    /// and writer tasks. Later frames arrive on the returned receiver.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<ServerEnvelope>)> {
        let (ws_stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        let (mut sink, mut stream) = ws_stream.split();

        let local_id = tokio::time::timeout(WELCOME_TIMEOUT, async {
            while let Some(msg) = stream.next().await {
                let Message::Text(text) = msg? else { continue };
                match serde_json::from_str::<ServerEnvelope>(text.as_str()) {
                    Ok(ServerEnvelope::Welcome { socket_id }) => return Ok(socket_id),
                    Ok(other) => debug!("Frame before welcome: {:?}", other),
                    Err(e) => warn!("Invalid frame before welcome: {}", e),
                }
            }
            bail!("Relay closed the connection before welcome")
        })
        .await
        .context("Timed out waiting for welcome")??;
        info!(%local_id, "Connected to relay");

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    warn!("WebSocket send failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerEnvelope>(text.as_str()) {
                            Ok(envelope) => {
                                if inbound_tx.send(envelope).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping invalid relay frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("WebSocket receive failed: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok((
            Self {
                local_id,
                outbound,
                writer,
                reader,
            },
            inbound_rx,
        ))
    }

    /// Identifier the relay assigned to this connection.
    pub fn local_id(&self) -> &ConnId {
        &self.local_id
    }

    pub fn is_open(&self) -> bool {
        !self.writer.is_finished() && !self.reader.is_finished()
    }

    /// Sends a close frame; the relay then announces our departure.
    pub fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
        self.reader.abort();
    }
}

impl SignalSink for SignalingClient {
    fn send(&self, envelope: ClientEnvelope) -> Result<(), MeshError> {
        let json =
            serde_json::to_string(&envelope).map_err(|e| MeshError::Signaling(e.to_string()))?;
        self.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| MeshError::Signaling("relay connection closed".to_owned()))
    }
}
