use crate::error::MediaError;
use crate::media::{MediaCapture, MediaConstraints, MediaStream, MediaTrack, TrackKind};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// A local track the application feeds with encoded samples.
pub struct LocalSampleTrack {
    id: String,
    kind: TrackKind,
    track: Arc<TrackLocalStaticSample>,
    stopped: AtomicBool,
}

impl LocalSampleTrack {
    pub fn new(kind: TrackKind, stream_id: &str) -> Self {
        let (codec, label) = match kind {
            TrackKind::Audio => (
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    ..Default::default()
                },
                "audio",
            ),
            TrackKind::Video => (
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    ..Default::default()
                },
                "video",
            ),
        };
        let id = format!("{label}-{}", Uuid::new_v4());
        let track = Arc::new(TrackLocalStaticSample::new(
            codec,
            id.clone(),
            stream_id.to_owned(),
        ));

        Self {
            id,
            kind,
            track,
            stopped: AtomicBool::new(false),
        }
    }

    /// Write encoded samples here; every connection sending this track
    /// forwards them.
    pub fn sample_track(&self) -> &Arc<TrackLocalStaticSample> {
        &self.track
    }
}

impl fmt::Debug for LocalSampleTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSampleTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl MediaTrack for LocalSampleTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Capture provider backed by sample-fed Opus/VP8 tracks.
#[derive(Debug, Default)]
pub struct SampleTrackCapture;

#[async_trait]
impl MediaCapture for SampleTrackCapture {
    async fn capture(&self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError> {
        if constraints.is_empty() {
            return Err(MediaError::ConstraintsUnsatisfiable(
                "neither audio nor video requested".to_owned(),
            ));
        }

        let stream_id = format!("local-{}", Uuid::new_v4());
        let mut tracks: Vec<Arc<dyn MediaTrack>> = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(LocalSampleTrack::new(TrackKind::Audio, &stream_id)));
        }
        if constraints.video {
            tracks.push(Arc::new(LocalSampleTrack::new(TrackKind::Video, &stream_id)));
        }

        debug!(stream = %stream_id, tracks = tracks.len(), "Created sample tracks");
        Ok(MediaStream::new(stream_id, tracks))
    }
}
