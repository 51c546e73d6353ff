use thiserror::Error;

/// Reasons a signaling frame cannot be turned into a typed event.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message has no room key")]
    MissingRoom,

    #[error("message has no sender identifier")]
    MissingSender,

    #[error("'{event}' membership event is missing its '{field}' field")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },

    #[error("malformed call payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("session description of type {found} cannot be used as {expected}")]
    DescriptionType {
        expected: &'static str,
        found: String,
    },
}
