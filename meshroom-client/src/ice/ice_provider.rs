use anyhow::{Context, Result};
use async_trait::async_trait;
use meshroom_core::IceConfig;
use std::time::Duration;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of the `{iceServers, iceCandidatePoolSize}` configuration.
#[async_trait]
pub trait IceConfigProvider: Send + Sync {
    async fn ice_config(&self) -> Result<IceConfig>;
}

/// Fixed configuration, for tests and offline setups.
pub struct StaticIceConfig(pub IceConfig);

#[async_trait]
impl IceConfigProvider for StaticIceConfig {
    async fn ice_config(&self) -> Result<IceConfig> {
        Ok(self.0.clone())
    }
}

/// Fetches the configuration from the relay's `/api/ice-servers` endpoint.
pub struct HttpIceConfig {
    client: reqwest::Client,
    url: String,
}

impl HttpIceConfig {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl IceConfigProvider for HttpIceConfig {
    async fn ice_config(&self) -> Result<IceConfig> {
        debug!(url = %self.url, "Fetching ICE configuration");
        let config = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.url))?
            .error_for_status()?
            .json::<IceConfig>()
            .await
            .context("Invalid ICE configuration body")?;
        Ok(config)
    }
}
