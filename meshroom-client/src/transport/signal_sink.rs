use crate::error::MeshError;
use meshroom_core::ClientEnvelope;

/// Outbound half of the signaling channel.
pub trait SignalSink: Send + Sync {
    fn send(&self, envelope: ClientEnvelope) -> Result<(), MeshError>;
}
