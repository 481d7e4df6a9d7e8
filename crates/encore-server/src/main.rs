//! encore: replays a captured game session to connecting clients.
//!
//! Point `ENCORE_CAPTURE` at a capture archive and connect a game client;
//! the client's own keybinds drive playback (move up = fast-forward,
//! move right = single frame, shoot = pause).

use tracing::{error, info};

use encore_server::app::{self, AppState, PLAY_PATH};
use encore_server::config::Config;
use encore_server::scheduler;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Load before binding anything: a bad archive must not leave a listener
    // up with nothing to replay.
    let recording = encore_capture::load_recording(
        &config.capture_path,
        PLAY_PATH,
        config.recording_ordinal,
    )
    .map_err(|e| {
        format!(
            "failed to load capture archive {}: {e}",
            config.capture_path.display()
        )
    })?;
    info!(
        capture = %config.capture_path.display(),
        recording_ordinal = config.recording_ordinal,
        frames = recording.len(),
        "capture loaded"
    );

    let state = AppState::new(config, recording);
    let http_addr = state.config.http_addr.clone();

    let http_listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .map_err(|e| format!("failed to bind HTTP on {http_addr}: {e}"))?;
    info!(
        %http_addr,
        advertise_addr = %state.config.advertise_addr,
        advertise_https = state.config.advertise_https,
        "encore ready"
    );

    let app = app::build_router(state.clone());
    tokio::select! {
        _ = scheduler::run(state.sessions.clone()) => {}
        result = axum::serve(http_listener, app) => {
            if let Err(e) = result {
                error!(%e, "HTTP server error");
            }
        }
    }
    Ok(())
}
