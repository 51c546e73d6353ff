use std::env;
use std::time::Duration;

pub const DEFAULT_DISCONNECT_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ICE_RESTARTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct MeshConfig {
    pub signaling_url: String,
    /// Where the HTTP ICE provider fetches `/api/ice-servers`.
    pub ice_url: String,
    /// How long a disconnected connection may self-recover before an ICE restart.
    pub disconnect_grace: Duration,
    pub max_ice_restarts: u32,
}

impl MeshConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let signaling_url = env::var("MESHROOM_SIGNALING_URL").unwrap_or(defaults.signaling_url);
        let ice_url = env::var("MESHROOM_ICE_URL").unwrap_or(defaults.ice_url);
        let disconnect_grace = env::var("MESHROOM_DISCONNECT_GRACE_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.disconnect_grace);
        let max_ice_restarts = env::var("MESHROOM_MAX_ICE_RESTARTS")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or(defaults.max_ice_restarts);

        Self {
            signaling_url,
            ice_url,
            disconnect_grace,
            max_ice_restarts,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://127.0.0.1:3000/ws".to_owned(),
            ice_url: "http://127.0.0.1:3000/api/ice-servers".to_owned(),
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            max_ice_restarts: DEFAULT_MAX_ICE_RESTARTS,
        }
    }
}
