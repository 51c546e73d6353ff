use crate::model::conn::ConnId;
use crate::model::error::ProtocolError;
use crate::model::room::{RoomKey, RoomMessage};
use crate::model::sdp::{IceCandidate, SdpType, SessionDescription};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque body of chat and video frames. The relay forwards it untouched.
pub type SyncPayload = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallEvent {
    Offer,
    Answer,
    Candidate,
}

/// Body of a `{type: "call"}` frame.
///
/// `data` stays untyped so the relay can forward it without inspecting it;
/// clients decode it with [`CallMessage::signal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMessage {
    pub event: CallEvent,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<ConnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_socket_id: Option<ConnId>,
}

impl CallMessage {
    pub fn new(signal: &CallSignal, room: RoomKey, target: Option<ConnId>) -> Self {
        Self {
            event: signal.event(),
            data: signal.to_data(),
            room_id: Some(room),
            socket_id: None,
            target_socket_id: target,
        }
    }

    pub fn room(&self) -> Option<&RoomKey> {
        self.room_id.as_ref().filter(|room| !room.is_blank())
    }

    /// Marks the message with the identifier of the connection it came from.
    pub fn stamped(mut self, from: ConnId) -> Self {
        self.socket_id = Some(from);
        self
    }

    pub fn signal(&self) -> Result<CallSignal, ProtocolError> {
        CallSignal::decode(self.event, &self.data)
    }
}

/// Typed negotiation payload carried by a call message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSignal {
    Offer(SessionDescription),
    Answer(SessionDescription),
    /// `None` is the end-of-candidates marker.
    Candidate(Option<IceCandidate>),
}

impl CallSignal {
    pub fn event(&self) -> CallEvent {
        match self {
            CallSignal::Offer(_) => CallEvent::Offer,
            CallSignal::Answer(_) => CallEvent::Answer,
            CallSignal::Candidate(_) => CallEvent::Candidate,
        }
    }

    pub fn to_data(&self) -> Value {
        let encoded = match self {
            CallSignal::Offer(desc) | CallSignal::Answer(desc) => serde_json::to_value(desc),
            CallSignal::Candidate(Some(candidate)) => serde_json::to_value(candidate),
            CallSignal::Candidate(None) => Ok(Value::Null),
        };
        // Both payload types are plain structs of strings and integers.
        encoded.unwrap_or(Value::Null)
    }

    pub fn decode(event: CallEvent, data: &Value) -> Result<Self, ProtocolError> {
        match event {
            CallEvent::Offer => Ok(CallSignal::Offer(description(data, SdpType::Offer)?)),
            CallEvent::Answer => Ok(CallSignal::Answer(description(data, SdpType::Answer)?)),
            CallEvent::Candidate if data.is_null() => Ok(CallSignal::Candidate(None)),
            CallEvent::Candidate => Ok(CallSignal::Candidate(Some(
                IceCandidate::deserialize(data)?,
            ))),
        }
    }
}

fn description(data: &Value, expected: SdpType) -> Result<SessionDescription, ProtocolError> {
    let desc = SessionDescription::deserialize(data)?;
    if desc.kind != expected {
        return Err(ProtocolError::DescriptionType {
            expected: expected.as_str(),
            found: desc.kind.as_str().to_owned(),
        });
    }
    Ok(desc)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Video,
    Chat,
}

/// Frames a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEnvelope {
    Room(RoomMessage),
    Call(CallMessage),
    Video(SyncPayload),
    Chat(SyncPayload),
}

impl ClientEnvelope {
    pub fn sync(kind: SyncKind, payload: SyncPayload) -> Self {
        match kind {
            SyncKind::Video => ClientEnvelope::Video(payload),
            SyncKind::Chat => ClientEnvelope::Chat(payload),
        }
    }
}

/// Frames the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEnvelope {
    /// First frame on every connection.
    Welcome {
        #[serde(rename = "socketId")]
        socket_id: ConnId,
    },
    Room(RoomMessage),
    Call(CallMessage),
    Video(SyncPayload),
    Chat(SyncPayload),
    Error {
        message: String,
    },
}

impl ServerEnvelope {
    pub fn sync(kind: SyncKind, payload: SyncPayload) -> Self {
        match kind {
            SyncKind::Video => ServerEnvelope::Video(payload),
            SyncKind::Chat => ServerEnvelope::Chat(payload),
        }
    }
}
