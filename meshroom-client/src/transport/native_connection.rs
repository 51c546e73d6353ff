use crate::media::MediaTrack;
use crate::transport::NativeEvent;
use anyhow::Result;
use async_trait::async_trait;
use meshroom_core::{ConnId, IceCandidate, IceConfig, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One native peer connection. Descriptions produced by `create_*` are not
/// applied until passed to `set_local_description`.
#[async_trait]
pub trait NativeConnection: Send + Sync {
    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription>;
    async fn create_answer(&self) -> Result<SessionDescription>;
    /// Also accepts a rollback description.
    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;
    async fn add_track(&self, track: Arc<dyn MediaTrack>) -> Result<()>;
    async fn remove_track(&self, track_id: &str) -> Result<()>;
    /// Detaches every listener, then closes the connection.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Builds a connection toward `peer` whose callbacks feed `events`.
    async fn create(
        &self,
        peer: &ConnId,
        ice: &IceConfig,
        events: mpsc::UnboundedSender<NativeEvent>,
    ) -> Result<Arc<dyn NativeConnection>>;
}
