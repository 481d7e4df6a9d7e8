use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::config::Config;

pub async fn health() -> impl IntoResponse {
    "ok"
}

/// One game descriptor in the shape the replayed game's client expects from
/// matchmaking. Field names are part of that protocol.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameDescriptor {
    zone: &'static str,
    data: &'static str,
    game_id: &'static str,
    use_https: bool,
    hosts: Vec<String>,
    addrs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FindGameResponse {
    res: Vec<GameDescriptor>,
}

fn matchmaking_response(config: &Config) -> FindGameResponse {
    let addr = config.advertise_addr.clone();
    FindGameResponse {
        res: vec![GameDescriptor {
            zone: "local",
            data: "",
            game_id: "replay",
            use_https: config.advertise_https,
            hosts: vec![addr.clone()],
            addrs: vec![addr],
        }],
    }
}

/// Matchmaking stub: every request matches into the replay, whatever the
/// body says. The descriptor points the client back at this server.
pub async fn find_game(State(state): State<AppState>) -> impl IntoResponse {
    info!(advertise_addr = %state.config.advertise_addr, "matchmaking request answered");
    match serde_json::to_string(&matchmaking_response(&state.config)) {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            json,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("serialization error: {e}"),
        )
            .into_response(),
    }
}
