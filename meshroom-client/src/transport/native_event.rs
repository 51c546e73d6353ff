use crate::media::MediaTrack;
use meshroom_core::IceCandidate;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Callbacks of a native connection, delivered in the order they fired.
#[derive(Debug)]
pub enum NativeEvent {
    /// `None` marks the end of gathering.
    LocalCandidate(Option<IceCandidate>),
    ConnectionState(PeerConnectionState),
    RemoteTrack {
        stream_id: String,
        track: Arc<dyn MediaTrack>,
    },
}
