//! Replay scenarios driven end to end through the registry, with channels
//! standing in for connections and raw protocol bytes driving control.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use encore_capture::Recording;
use encore_server::playback::PlaybackSession;
use encore_server::registry::{SessionId, SessionRegistry};
use encore_wire::decode_client_message;

/// Comfortably past the emission threshold in one pass.
const BIG_DT: f64 = 0.05;

const FLAG_MOVE_RIGHT: u8 = 1 << 1;
const FLAG_MOVE_UP: u8 = 1 << 2;
const FLAG_SHOOT_START: u8 = 1 << 4;

fn recording(frames: usize) -> Arc<Recording> {
    Arc::new(Recording::new(
        (0..frames).map(|i| Bytes::from(vec![i as u8])).collect(),
    ))
}

fn input_frame(seq: u8, flags: u8) -> Vec<u8> {
    vec![3, seq, flags]
}

async fn apply_control(registry: &SessionRegistry, id: SessionId, raw: &[u8]) {
    let message = decode_client_message(raw).expect("control frame should decode");
    if let Some(intent) = message.control_intent() {
        registry.apply(id, intent).await;
    }
}

#[tokio::test]
async fn recording_plays_to_completion_and_closes() {
    let registry = SessionRegistry::new();
    let (tx, mut rx) = mpsc::channel(8);
    registry
        .register(PlaybackSession::new(recording(3)), tx)
        .await;

    for expected in 0..3u8 {
        registry.advance_all(BIG_DT).await;
        assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![expected])));
    }

    registry.advance_all(BIG_DT).await;
    assert_eq!(registry.len().await, 0);
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn pause_step_resume_flow() {
    let registry = SessionRegistry::new();
    let (tx, mut rx) = mpsc::channel(8);
    let id = registry
        .register(PlaybackSession::new(recording(5)), tx)
        .await;

    registry.advance_all(BIG_DT).await;
    assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![0])));

    // Shoot toggles pause; playback goes quiet.
    apply_control(&registry, id, &input_frame(1, FLAG_SHOOT_START)).await;
    for _ in 0..20 {
        registry.advance_all(BIG_DT).await;
    }
    assert!(rx.try_recv().is_err());

    // Move right asks for exactly one frame, pause notwithstanding.
    apply_control(&registry, id, &input_frame(2, FLAG_MOVE_RIGHT)).await;
    registry.advance_all(0.0).await;
    assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![1])));
    registry.advance_all(BIG_DT).await;
    assert!(rx.try_recv().is_err());

    // Shoot again resumes timed playback.
    apply_control(&registry, id, &input_frame(3, FLAG_SHOOT_START)).await;
    registry.advance_all(BIG_DT).await;
    assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![2])));
}

#[tokio::test]
async fn fast_forward_is_a_held_key() {
    let registry = SessionRegistry::new();
    let (tx, mut rx) = mpsc::channel(8);
    let id = registry
        .register(PlaybackSession::new(recording(8)), tx)
        .await;

    // Holding move up reaches the threshold in a single 4 ms pass.
    apply_control(&registry, id, &input_frame(1, FLAG_MOVE_UP)).await;
    registry.advance_all(0.004).await;
    assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![0])));

    // Releasing the key (an input with the flag clear) restores base rate.
    apply_control(&registry, id, &input_frame(2, 0)).await;
    registry.advance_all(0.004).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn garbage_control_frames_do_not_disturb_playback() {
    let registry = SessionRegistry::new();
    let (tx, mut rx) = mpsc::channel(8);
    let id = registry
        .register(PlaybackSession::new(recording(4)), tx)
        .await;

    registry.advance_all(BIG_DT).await;
    assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![0])));

    // An unknown tag and a truncated input both fail to decode; neither may
    // reach the session.
    assert!(decode_client_message(&[0xFF, 1, 2, 3]).is_err());
    assert!(decode_client_message(&[3, 9]).is_err());
    registry.advance_all(BIG_DT).await;
    assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![1])));

    // The next well-formed toggle applies exactly once.
    apply_control(&registry, id, &input_frame(1, FLAG_SHOOT_START)).await;
    for _ in 0..20 {
        registry.advance_all(BIG_DT).await;
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn sessions_play_back_independently() {
    let registry = SessionRegistry::new();
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    let a = registry
        .register(PlaybackSession::new(recording(4)), tx_a)
        .await;
    registry
        .register(PlaybackSession::new(recording(4)), tx_b)
        .await;

    // Pausing one session leaves the other's cursor alone.
    apply_control(&registry, a, &input_frame(1, FLAG_SHOOT_START)).await;
    registry.advance_all(BIG_DT).await;
    registry.advance_all(BIG_DT).await;

    assert!(rx_a.try_recv().is_err());
    assert_eq!(rx_b.try_recv(), Ok(Bytes::from(vec![0])));
    assert_eq!(rx_b.try_recv(), Ok(Bytes::from(vec![1])));
}
