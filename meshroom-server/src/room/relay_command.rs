use meshroom_core::{ClientEnvelope, ConnId};

/// Commands the WebSocket layer feeds into the relay loop.
#[derive(Debug)]
pub enum RelayCommand {
    /// A decoded frame from a connected client.
    Inbound {
        conn_id: ConnId,
        envelope: ClientEnvelope,
    },

    /// The client's socket closed, cleanly or not.
    Disconnect { conn_id: ConnId },
}
