use crate::model::conn::ConnId;
use crate::model::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied room key. Surrounding whitespace is not significant.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(from = "String", into = "String")]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(key.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for RoomKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RoomKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<RoomKey> for String {
    fn from(key: RoomKey) -> Self {
        key.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomEvent {
    Join,
    Leave,
    Peers,
}

/// Body of a `{type: "room"}` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub event: RoomEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<ConnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<ConnId>>,
}

impl RoomMessage {
    /// Client request to enter or leave a room.
    pub fn request(event: RoomEvent, room: RoomKey) -> Self {
        Self {
            event,
            room_id: Some(room),
            socket_id: None,
            peers: None,
        }
    }

    /// The room key, if present and not blank.
    pub fn room(&self) -> Option<&RoomKey> {
        self.room_id.as_ref().filter(|room| !room.is_blank())
    }
}

/// Typed view of the membership frames the relay emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    Join { room: RoomKey, peer: ConnId },
    Leave { room: RoomKey, peer: ConnId },
    /// Members present before the receiver joined, in join order.
    PeerList { room: RoomKey, peers: Vec<ConnId> },
}

impl MembershipEvent {
    pub fn room(&self) -> &RoomKey {
        match self {
            MembershipEvent::Join { room, .. }
            | MembershipEvent::Leave { room, .. }
            | MembershipEvent::PeerList { room, .. } => room,
        }
    }
}

impl From<MembershipEvent> for RoomMessage {
    fn from(event: MembershipEvent) -> Self {
        match event {
            MembershipEvent::Join { room, peer } => RoomMessage {
                event: RoomEvent::Join,
                room_id: Some(room),
                socket_id: Some(peer),
                peers: None,
            },
            MembershipEvent::Leave { room, peer } => RoomMessage {
                event: RoomEvent::Leave,
                room_id: Some(room),
                socket_id: Some(peer),
                peers: None,
            },
            MembershipEvent::PeerList { room, peers } => RoomMessage {
                event: RoomEvent::Peers,
                room_id: Some(room),
                socket_id: None,
                peers: Some(peers),
            },
        }
    }
}

impl TryFrom<RoomMessage> for MembershipEvent {
    type Error = ProtocolError;

    fn try_from(msg: RoomMessage) -> Result<Self, Self::Error> {
        let room = msg.room().cloned().ok_or(ProtocolError::MissingRoom)?;

        match msg.event {
            RoomEvent::Join => Ok(MembershipEvent::Join {
                room,
                peer: msg.socket_id.ok_or(ProtocolError::MissingField {
                    event: "join",
                    field: "socketId",
                })?,
            }),
            RoomEvent::Leave => Ok(MembershipEvent::Leave {
                room,
                peer: msg.socket_id.ok_or(ProtocolError::MissingField {
                    event: "leave",
                    field: "socketId",
                })?,
            }),
            RoomEvent::Peers => Ok(MembershipEvent::PeerList {
                room,
                peers: msg.peers.unwrap_or_default(),
            }),
        }
    }
}
