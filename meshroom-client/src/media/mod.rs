mod local_media;
mod media_capture;
mod media_track;

pub use local_media::*;
pub use media_capture::*;
pub use media_track::*;
