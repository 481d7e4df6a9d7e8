//! Capture archive loading.
//!
//! A capture archive is HAR-shaped JSON produced by recording browser traffic
//! against a live game. Entries whose request URL contains the play endpoint
//! carry the WebSocket exchange of one session; the server-to-client messages
//! in that exchange, base64-decoded, become the frames of a [`Recording`].

use std::fmt;
use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use serde::Deserialize;

/// One server-sent payload, replayed verbatim.
pub type Frame = Bytes;

/// Ordered frames of one captured session.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    frames: Vec<Frame>,
}

impl Recording {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Payload { entry: usize, source: base64::DecodeError },
    OutOfRange { ordinal: usize, available: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read capture archive: {err}"),
            Self::Json(err) => write!(f, "malformed capture archive: {err}"),
            Self::Payload { entry, source } => {
                write!(f, "invalid message payload in capture entry {entry}: {source}")
            }
            Self::OutOfRange { ordinal, available } => {
                write!(
                    f,
                    "no recording at ordinal {ordinal}: archive holds {available} non-empty recording(s)"
                )
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Deserialize)]
struct CaptureArchive {
    log: CaptureLog,
}

#[derive(Debug, Deserialize)]
struct CaptureLog {
    #[serde(default)]
    entries: Vec<CaptureEntry>,
}

#[derive(Debug, Deserialize)]
struct CaptureEntry {
    request: CaptureRequest,
    #[serde(rename = "_webSocketMessages", default)]
    web_socket_messages: Vec<CapturedMessage>,
}

#[derive(Debug, Deserialize)]
struct CaptureRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CapturedMessage {
    #[serde(rename = "type")]
    direction: String,
    data: String,
}

/// Extract every non-empty recording from raw archive JSON, in archive order.
///
/// Only entries whose request URL contains `endpoint_marker` are considered;
/// within them, client-to-server messages (`"type": "send"`) are skipped.
pub fn parse_recordings(raw: &[u8], endpoint_marker: &str) -> Result<Vec<Recording>, LoadError> {
    let archive: CaptureArchive = serde_json::from_slice(raw)?;
    let mut recordings = Vec::new();
    for (entry_index, entry) in archive.log.entries.iter().enumerate() {
        if !entry.request.url.contains(endpoint_marker) {
            continue;
        }
        let mut frames = Vec::with_capacity(entry.web_socket_messages.len());
        for message in &entry.web_socket_messages {
            if message.direction == "send" {
                continue;
            }
            let payload = general_purpose::STANDARD
                .decode(&message.data)
                .map_err(|source| LoadError::Payload {
                    entry: entry_index,
                    source,
                })?;
            frames.push(Bytes::from(payload));
        }
        if !frames.is_empty() {
            recordings.push(Recording::new(frames));
        }
    }
    Ok(recordings)
}

/// Load the archive at `path` and pick one recording by ordinal among the
/// non-empty ones.
pub fn load_recording(
    path: &Path,
    endpoint_marker: &str,
    ordinal: usize,
) -> Result<Recording, LoadError> {
    let raw = fs::read(path)?;
    let recordings = parse_recordings(&raw, endpoint_marker)?;
    let available = recordings.len();
    recordings
        .into_iter()
        .nth(ordinal)
        .ok_or(LoadError::OutOfRange { ordinal, available })
}
