use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A local or remote media track. Tracks are shared by reference between
/// every peer connection that sends or renders them.
pub trait MediaTrack: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;
    fn kind(&self) -> TrackKind;
    fn stop(&self);
    fn is_stopped(&self) -> bool;
    /// Lets a connection backend recover its own concrete track type.
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone)]
pub struct MediaStream {
    pub id: String,
    pub tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn track_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(|track| track.id()).collect()
    }

    pub fn has_track(&self, id: &str) -> bool {
        self.tracks.iter().any(|track| track.id() == id)
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}
