use anyhow::{Context, Result};
use meshroom_client::webrtc_backend::{SampleTrackCapture, WebRtcConnectionFactory};
use meshroom_client::{
    HttpIceConfig, MediaConstraints, MediaStream, MeshConfig, MeshManager, RenderSink,
    SignalingClient,
};
use meshroom_core::{ConnId, SyncKind, SyncPayload};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs the remote stream mapping.
struct LogSink;

impl RenderSink for LogSink {
    fn render(&self, streams: &HashMap<ConnId, MediaStream>) {
        info!(peers = streams.len(), "Remote streams changed");
        for (peer, stream) in streams {
            info!(%peer, stream = %stream.id, tracks = ?stream.track_ids(), "Remote stream");
        }
    }

    fn sync(&self, kind: SyncKind, payload: &SyncPayload) {
        info!(?kind, "Sync event: {}", serde_json::Value::Object(payload.clone()));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = MeshConfig::from_env();
    let room = env::var("MESHROOM_ROOM").unwrap_or_else(|_| "lobby".to_owned());

    let (signaling, inbound) = SignalingClient::connect(&config.signaling_url).await?;
    let signaling = Arc::new(signaling);
    let ice = Arc::new(HttpIceConfig::new(config.ice_url.clone())?);
    let factory = Arc::new(WebRtcConnectionFactory::new().context("Failed to set up WebRTC")?);

    let manager = MeshManager::new(
        signaling.local_id().clone(),
        config,
        signaling.clone(),
        factory,
        Arc::new(SampleTrackCapture),
        ice,
    );
    let mesh = manager.spawn(inbound);
    mesh.register_sink(Arc::new(LogSink)).await?;
    mesh.join_room(room.as_str(), MediaConstraints::default()).await?;
    info!(%room, local_id = %signaling.local_id(), "Joined. Press Ctrl-C to leave.");

    tokio::signal::ctrl_c().await?;
    mesh.leave_room().await?;
    signaling.close();
    Ok(())
}
