mod cached_ice_config;
mod ice_provider;

pub use cached_ice_config::*;
pub use ice_provider::*;
