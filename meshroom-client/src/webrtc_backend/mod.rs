//! Native connection backend on webrtc-rs.

mod remote_track;
mod sample_capture;
mod webrtc_connection;

pub use remote_track::*;
pub use sample_capture::*;
pub use webrtc_connection::*;
