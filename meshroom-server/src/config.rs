use meshroom_core::IceServerConfig;
use meshroom_core::utils::{
    DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3, METERED_STUN_ADDR,
};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub ip: IpAddr,
    pub cors_origin: String,
    pub ice_servers: Vec<IceServerConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("PORT")
            .or_else(|_| env::var("BACKEND_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let ip = env::var("IP")
            .ok()
            .and_then(|ip| ip.parse().ok())
            .unwrap_or(defaults.ip);
        let cors_origin = env::var("CORS_ORIGIN")
            .ok()
            .filter(|origin| !origin.is_empty())
            .unwrap_or(defaults.cors_origin);
        let ice_servers = parse_ice_servers(env::var("ICE_SERVERS").ok().as_deref());

        Self {
            port,
            ip,
            cors_origin,
            ice_servers,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            cors_origin: "*".to_owned(),
            ice_servers: default_ice_servers(),
        }
    }
}

pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun([DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3]),
        IceServerConfig::stun([METERED_STUN_ADDR]),
    ]
}

/// Extra servers from `ICE_SERVERS` are appended to the STUN defaults.
pub fn parse_ice_servers(raw: Option<&str>) -> Vec<IceServerConfig> {
    let mut servers = default_ice_servers();
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return servers;
    };

    match serde_json::from_str::<Vec<IceServerConfig>>(raw) {
        Ok(extra) => servers.extend(extra),
        Err(e) => warn!("Failed to parse ICE_SERVERS, using defaults: {}", e),
    }
    servers
}
