use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use encore_capture::Recording;

use crate::api;
use crate::config::Config;
use crate::registry::SessionRegistry;
use crate::ws;

/// Path clients connect to. Doubles as the marker that picks protocol
/// sessions out of the capture archive.
pub const PLAY_PATH: &str = "/play";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recording: Arc<Recording>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, recording: Recording) -> Self {
        Self {
            config: Arc::new(config),
            recording: Arc::new(recording),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/find_game", post(api::find_game))
        .route(PLAY_PATH, get(ws::play_upgrade))
        .with_state(state)
}
