use std::fmt;

/// Negotiation state of one peer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalingState {
    Idle,
    HaveLocalOffer,
    Stable,
    /// The connection failed; an ICE restart is being attempted.
    Failed,
    Closed,
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalingState::Idle => "idle",
            SignalingState::HaveLocalOffer => "have-local-offer",
            SignalingState::Stable => "stable",
            SignalingState::Failed => "failed",
            SignalingState::Closed => "closed",
        })
    }
}
