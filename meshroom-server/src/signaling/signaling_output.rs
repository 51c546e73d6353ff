use async_trait::async_trait;
use meshroom_core::{ConnId, ServerEnvelope};

/// Where the relay hands frames for delivery to a single connection.
///
/// Implementations must not block and must drop frames for connections that
/// are gone; recovery belongs to the negotiation layer.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn deliver(&self, conn_id: &ConnId, envelope: ServerEnvelope);
}
