use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use encore_wire::{ClientMessage, decode_client_message};

use crate::app::AppState;
use crate::playback::PlaybackSession;
use crate::registry::{OUTBOUND_BUFFER_FRAMES, SessionId};

pub async fn play_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_play(socket, state))
}

/// One connection: register a playback session, pump due frames out, decode
/// control messages in.
async fn handle_play(socket: WebSocket, state: AppState) {
    let (frame_tx, mut frame_rx) = mpsc::channel(OUTBOUND_BUFFER_FRAMES);
    let playback = PlaybackSession::new(state.recording.clone());
    let session_id = state.sessions.register(playback, frame_tx).await;
    info!(
        session_id = %session_id,
        frames = state.recording.len(),
        "client connected, replay started"
    );

    let (mut sender, mut receiver) = socket.split();

    // The channel closing means the registry dropped this session, either
    // because the recording ran out or the buffer stalled. Drain what is
    // already queued, then say goodbye.
    let writer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if sender.send(Message::Binary(frame)).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    while let Some(message) = receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!(session_id = %session_id, %e, "transport error, closing");
                break;
            }
        };
        match message {
            Message::Binary(raw) => handle_control(&state, session_id, &raw).await,
            Message::Close(_) => break,
            // Text frames are not part of the protocol; ping/pong belong to
            // the transport.
            _ => {}
        }
    }

    if state.sessions.remove(session_id).await {
        info!(session_id = %session_id, "client disconnected");
    }
    writer.abort();
}

/// Decode one inbound frame and route its playback effect, if any. Garbage
/// must not kill playback: undecodable frames are dropped.
async fn handle_control(state: &AppState, session_id: SessionId, raw: &[u8]) {
    let message = match decode_client_message(raw) {
        Ok(message) => message,
        Err(e) => {
            debug!(session_id = %session_id, %e, "dropping undecodable control frame");
            return;
        }
    };
    match message {
        ClientMessage::Input(input) => {
            let intent = input.control_intent();
            debug!(
                session_id = %session_id,
                seq = input.seq,
                accelerate = intent.accelerate,
                step = intent.step,
                toggle_pause = intent.toggle_pause,
                "input applied"
            );
            state.sessions.apply(session_id, intent).await;
        }
        other => {
            debug!(
                session_id = %session_id,
                msg_type = %other.msg_type(),
                "ignoring message without playback effect"
            );
        }
    }
}
