use crate::media::MediaStream;
use meshroom_core::{ConnId, SyncKind, SyncPayload};
use std::collections::HashMap;

/// Observer of the mesh's externally visible output.
pub trait RenderSink: Send + Sync {
    /// Called with the full peer → stream mapping after every change.
    fn render(&self, streams: &HashMap<ConnId, MediaStream>);

    /// Chat and video events relayed from other members.
    fn sync(&self, _kind: SyncKind, _payload: &SyncPayload) {}
}
