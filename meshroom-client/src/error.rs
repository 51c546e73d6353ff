use meshroom_core::ConnId;
use thiserror::Error;

/// Failures of local media acquisition. These gate the stream shared by all
/// peers, so they are surfaced to the caller instead of being logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("permission to capture media was denied")]
    PermissionDenied,
    #[error("no capture device satisfies the constraints: {0}")]
    ConstraintsUnsatisfiable(String),
    #[error("media capture unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("negotiation with {peer} failed: {reason}")]
    Negotiation { peer: ConnId, reason: String },
    #[error("not joined to a room")]
    NotJoined,
    #[error("signaling channel error: {0}")]
    Signaling(String),
    #[error("mesh manager stopped")]
    Stopped,
}

impl MeshError {
    pub fn negotiation(peer: &ConnId, err: &anyhow::Error) -> Self {
        MeshError::Negotiation {
            peer: peer.clone(),
            reason: format!("{err:#}"),
        }
    }

    /// Whether a peer record hitting this error must be torn down.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MeshError::Precondition(_))
    }
}
