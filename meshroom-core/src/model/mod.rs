mod conn;
mod error;
mod ice;
mod room;
mod sdp;
mod signaling;

pub use conn::ConnId;
pub use error::ProtocolError;
pub use ice::{IceConfig, IceServerConfig};
pub use room::{MembershipEvent, RoomEvent, RoomKey, RoomMessage};
pub use sdp::{IceCandidate, SdpType, SessionDescription};
pub use signaling::{
    CallEvent, CallMessage, CallSignal, ClientEnvelope, ServerEnvelope, SyncKind, SyncPayload,
};
