use crate::media::{MediaStream, MediaTrack};
use meshroom_core::ConnId;
use std::collections::HashMap;
use std::sync::Arc;

/// Latest remote stream per peer.
#[derive(Debug, Default)]
pub struct RemoteStreams {
    streams: HashMap<ConnId, MediaStream>,
}

impl RemoteStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `track` to the peer's stream. A different stream id replaces the
    /// previous stream. Returns false when nothing changed.
    pub fn attach(&mut self, peer: &ConnId, stream_id: &str, track: Arc<dyn MediaTrack>) -> bool {
        match self.streams.get_mut(peer) {
            Some(stream) if stream.id == stream_id => {
                if stream.has_track(track.id()) {
                    return false;
                }
                stream.tracks.push(track);
            }
            _ => {
                self.streams
                    .insert(peer.clone(), MediaStream::new(stream_id, vec![track]));
            }
        }
        true
    }

    pub fn remove(&mut self, peer: &ConnId) -> bool {
        self.streams.remove(peer).is_some()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.streams.is_empty();
        self.streams.clear();
        changed
    }

    pub fn as_map(&self) -> &HashMap<ConnId, MediaStream> {
        &self.streams
    }
}
