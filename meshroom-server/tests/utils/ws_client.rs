use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use meshroom_core::{ClientEnvelope, ConnId, ServerEnvelope};
use meshroom_server::{AppState, ServerConfig, build_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected frame (ms).
pub const FRAME_TIMEOUT_MS: u64 = 2000;

/// Starts the full HTTP app on an ephemeral loopback port.
pub async fn spawn_server() -> Result<SocketAddr> {
    let config = ServerConfig::default();
    let state = Arc::new(AppState::new(&config));
    let app = build_router(state, &config.cors_origin)?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind test listener")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(addr)
}

pub struct WsTestClient {
    pub conn_id: ConnId,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTestClient {
    /// Connects and consumes the welcome frame.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("Failed to connect")?;

        let mut client = Self {
            conn_id: ConnId::from(""),
            stream,
        };

        match client.recv().await? {
            ServerEnvelope::Welcome { socket_id } => client.conn_id = socket_id,
            other => bail!("Expected welcome, got {:?}", other),
        }
        Ok(client)
    }

    pub async fn send(&mut self, envelope: &ClientEnvelope) -> Result<()> {
        let json = serde_json::to_string(envelope)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn recv(&mut self) -> Result<ServerEnvelope> {
        let timeout = Duration::from_millis(FRAME_TIMEOUT_MS);
        loop {
            let msg = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timed out waiting for frame")?
                .context("Stream closed")??;

            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).context("Invalid server frame");
            }
        }
    }

    /// True when nothing arrives within `ms`.
    pub async fn is_quiet(&mut self, ms: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(ms), self.stream.next())
            .await
            .is_err()
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("Failed to close")
    }
}
