use crate::config::ServerConfig;
use crate::room::{RelayCommand, SignalingRelay};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use meshroom_core::IceConfig;
use meshroom_core::utils::DEFAULT_ICE_CANDIDATE_POOL_SIZE;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub struct AppState {
    pub signaling: SignalingService,
    pub relay_tx: mpsc::Sender<RelayCommand>,
    pub ice_config: IceConfig,
}

impl AppState {
    /// Spawns the relay loop and wires it to a fresh connection table.
    pub fn new(config: &ServerConfig) -> Self {
        let signaling = SignalingService::new();
        let relay_tx = SignalingRelay::spawn(Arc::new(signaling.clone()));

        Self {
            signaling,
            relay_tx,
            ice_config: IceConfig {
                ice_servers: config.ice_servers.clone(),
                ice_candidate_pool_size: DEFAULT_ICE_CANDIDATE_POOL_SIZE,
            },
        }
    }
}

pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Result<Router> {
    let allow_origin = if cors_origin == "*" {
        AllowOrigin::from(Any)
    } else {
        let origin = HeaderValue::from_str(cors_origin)
            .with_context(|| format!("Invalid CORS origin '{cors_origin}'"))?;
        AllowOrigin::exact(origin)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/ice-servers", get(ice_servers))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(state))
}

async fn ice_servers(State(state): State<Arc<AppState>>) -> Json<IceConfig> {
    Json(state.ice_config.clone())
}
