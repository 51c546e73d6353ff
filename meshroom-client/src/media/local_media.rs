use crate::error::MediaError;
use crate::media::{MediaCapture, MediaConstraints, MediaStream, MediaTrack};
use std::sync::Arc;
use tracing::{debug, info};

/// Owner of the single local capture of a session.
pub struct LocalMedia {
    capture: Arc<dyn MediaCapture>,
    stream: Option<MediaStream>,
}

impl LocalMedia {
    pub fn new(capture: Arc<dyn MediaCapture>) -> Self {
        Self {
            capture,
            stream: None,
        }
    }

    /// Returns the live stream, capturing only if there is none yet.
    pub async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError> {
        if let Some(stream) = &self.stream {
            debug!(stream = %stream.id, "Reusing local stream");
            return Ok(stream.clone());
        }
        self.capture_new(constraints).await
    }

    /// Captures a new stream and only then stops the current one. A failed
    /// capture leaves the current stream live.
    pub async fn replace(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError> {
        let previous = self.stream.take();
        match self.capture_new(constraints).await {
            Ok(stream) => {
                if let Some(previous) = previous {
                    previous.stop();
                }
                Ok(stream)
            }
            Err(e) => {
                self.stream = previous;
                Err(e)
            }
        }
    }

    async fn capture_new(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError> {
        if constraints.is_empty() {
            return Err(MediaError::ConstraintsUnsatisfiable(
                "neither audio nor video requested".to_owned(),
            ));
        }

        let stream = self.capture.capture(constraints).await?;
        info!(stream = %stream.id, tracks = stream.tracks.len(), "Captured local stream");
        self.stream = Some(stream.clone());
        Ok(stream)
    }

    pub fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.stream
            .as_ref()
            .map(|stream| stream.tracks.clone())
            .unwrap_or_default()
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }
}
