use crate::error::MediaError;
use crate::media::MediaStream;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.audio && !self.video
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Local capture device access.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn capture(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError>;
}
