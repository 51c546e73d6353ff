use crate::model::{IceConfig, IceServerConfig};

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const METERED_STUN_ADDR: &str = "stun:stun.relay.metered.ca:80";

pub const DEFAULT_ICE_CANDIDATE_POOL_SIZE: u8 = 10;

/// STUN-only configuration used whenever no ICE configuration could be fetched.
pub fn stun_only_ice_config() -> IceConfig {
    IceConfig {
        ice_servers: vec![IceServerConfig::stun([
            DEFAULT_STUN_ADDR,
            DEFAULT_STUN_ADDR_2,
            DEFAULT_STUN_ADDR_3,
        ])],
        ice_candidate_pool_size: DEFAULT_ICE_CANDIDATE_POOL_SIZE,
    }
}
