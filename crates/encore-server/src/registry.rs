use std::collections::HashMap;
use std::fmt;

use encore_capture::Frame;
use encore_wire::ControlIntent;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::playback::{PlaybackSession, Step};

/// Frames buffered per connection before the transport counts as stalled.
pub const OUTBOUND_BUFFER_FRAMES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct SessionEntry {
    tx: mpsc::Sender<Frame>,
    playback: PlaybackSession,
}

struct RegistryInner {
    next_id: u64,
    sessions: HashMap<SessionId, SessionEntry>,
}

/// The set of live replay sessions.
///
/// Shared between the upgrade path (register/remove), per-connection readers
/// (apply), and the tick scheduler (advance_all, which also removes sessions
/// that finished or stalled).
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 1,
                sessions: HashMap::new(),
            }),
        }
    }

    /// Add a session. Frames that come due for it are pushed into `tx`.
    pub async fn register(&self, playback: PlaybackSession, tx: mpsc::Sender<Frame>) -> SessionId {
        let mut inner = self.inner.lock().await;
        let id = SessionId(inner.next_id);
        inner.next_id += 1;
        inner.sessions.insert(id, SessionEntry { tx, playback });
        id
    }

    /// Remove a session. Removing an already-removed id is a no-op.
    pub async fn remove(&self, id: SessionId) -> bool {
        self.inner.lock().await.sessions.remove(&id).is_some()
    }

    /// Route a decoded intent to its session. Intents for sessions that
    /// already ended are dropped.
    pub async fn apply(&self, id: SessionId, intent: ControlIntent) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.sessions.get_mut(&id) {
            entry.playback.apply(intent);
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// One scheduler pass: advance every session by `dt` elapsed seconds and
    /// drop the ones that finished or whose connection stopped draining.
    pub async fn advance_all(&self, dt: f64) {
        let mut inner = self.inner.lock().await;
        inner.sessions.retain(|id, entry| {
            match entry.playback.advance(dt) {
                Step::Idle => true,
                Step::Emit(frame) => match entry.tx.try_send(frame) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!(session_id = %id, "connection gone, dropping session");
                        false
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Never skip frames for a live session: a buffer this
                        // deep only fills when the transport stopped draining.
                        warn!(
                            session_id = %id,
                            frames_sent = entry.playback.cursor(),
                            "outbound buffer full, dropping stalled session"
                        );
                        false
                    }
                },
                Step::Exhausted => {
                    info!(
                        session_id = %id,
                        frames_sent = entry.playback.cursor(),
                        "recording exhausted, closing connection"
                    );
                    false
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use encore_capture::Recording;
    use std::sync::Arc;

    const BIG_DT: f64 = 0.05;

    fn recording(frames: usize) -> Arc<Recording> {
        Arc::new(Recording::new(
            (0..frames).map(|i| Bytes::from(vec![i as u8])).collect(),
        ))
    }

    fn session(frames: usize) -> PlaybackSession {
        PlaybackSession::new(recording(frames))
    }

    #[tokio::test]
    async fn register_allocates_distinct_ids() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let a = registry.register(session(1), tx.clone()).await;
        let b = registry.register(session(1), tx).await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn advance_all_emits_into_channel() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        registry.register(session(2), tx).await;

        registry.advance_all(BIG_DT).await;
        assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![0])));
        registry.advance_all(BIG_DT).await;
        assert_eq!(rx.try_recv(), Ok(Bytes::from(vec![1])));
    }

    #[tokio::test]
    async fn exhausted_session_removed_and_channel_closed() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        let id = registry.register(session(1), tx).await;

        registry.advance_all(BIG_DT).await;
        registry.advance_all(BIG_DT).await;
        assert_eq!(registry.len().await, 0);
        assert!(!registry.remove(id).await);

        assert_eq!(rx.recv().await, Some(Bytes::from(vec![0])));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn closed_receiver_drops_session() {
        let registry = SessionRegistry::new();
        let (tx, rx) = mpsc::channel(4);
        registry.register(session(3), tx).await;
        drop(rx);

        registry.advance_all(BIG_DT).await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn undrained_buffer_drops_session() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        registry.register(session(3), tx).await;

        registry.advance_all(BIG_DT).await;
        assert_eq!(registry.len().await, 1);
        registry.advance_all(BIG_DT).await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn apply_reaches_only_the_addressed_session() {
        let registry = SessionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        let a = registry.register(session(3), tx_a).await;
        registry.register(session(3), tx_b).await;

        registry
            .apply(
                a,
                ControlIntent {
                    accelerate: false,
                    step: false,
                    toggle_pause: true,
                },
            )
            .await;

        registry.advance_all(BIG_DT).await;
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv(), Ok(Bytes::from(vec![0])));
    }

    #[tokio::test]
    async fn apply_to_removed_session_is_dropped() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let id = registry.register(session(1), tx).await;
        assert!(registry.remove(id).await);

        registry
            .apply(
                id,
                ControlIntent {
                    accelerate: true,
                    step: true,
                    toggle_pause: true,
                },
            )
            .await;
        assert_eq!(registry.len().await, 0);
    }
}
