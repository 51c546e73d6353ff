use crate::ice::IceConfigProvider;
use anyhow::Result;
use async_trait::async_trait;
use meshroom_core::IceConfig;
use meshroom_core::utils::stun_only_ice_config;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Remembers the first successful fetch for the process lifetime. Failures
/// yield the STUN-only default and are retried on the next call.
pub struct CachedIceConfig {
    inner: Arc<dyn IceConfigProvider>,
    cached: Mutex<Option<IceConfig>>,
}

impl CachedIceConfig {
    pub fn new(inner: Arc<dyn IceConfigProvider>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }

    pub async fn resolve(&self) -> IceConfig {
        let mut cached = self.cached.lock().await;
        if let Some(config) = cached.as_ref() {
            return config.clone();
        }

        match self.inner.ice_config().await {
            Ok(config) if !config.ice_servers.is_empty() => {
                *cached = Some(config.clone());
                config
            }
            Ok(_) => {
                warn!("ICE configuration has no servers, using STUN defaults");
                stun_only_ice_config()
            }
            Err(e) => {
                warn!("Failed to fetch ICE configuration, using STUN defaults: {:#}", e);
                stun_only_ice_config()
            }
        }
    }
}

#[async_trait]
impl IceConfigProvider for CachedIceConfig {
    async fn ice_config(&self) -> Result<IceConfig> {
        Ok(self.resolve().await)
    }
}
