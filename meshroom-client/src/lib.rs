mod config;
mod error;
mod ice;
mod media;
mod mesh;
mod peer;
mod signaling;
mod transport;
pub mod webrtc_backend;

pub use config::*;
pub use error::*;
pub use ice::*;
pub use media::*;
pub use mesh::*;
pub use peer::*;
pub use signaling::*;
pub use transport::*;
