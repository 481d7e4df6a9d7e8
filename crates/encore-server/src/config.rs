use std::path::PathBuf;

/// Startup configuration, read once from the environment:
///
/// - `ENCORE_HTTP`: HTTP/WebSocket bind address (default `127.0.0.1:8001`)
/// - `ENCORE_ADVERTISE`: address the matchmaking stub hands out
///   (default: the bind address)
/// - `ENCORE_ADVERTISE_HTTPS`: advertise https/wss (`1`/`true`, default off)
/// - `ENCORE_CAPTURE`: capture archive path (required)
/// - `ENCORE_RECORDING`: ordinal of the recording to serve, among the
///   archive's non-empty recordings (default 0)
#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,
    pub advertise_addr: String,
    pub advertise_https: bool,
    pub capture_path: PathBuf,
    pub recording_ordinal: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let http_addr = std::env::var("ENCORE_HTTP").unwrap_or_else(|_| "127.0.0.1:8001".into());
        let advertise_addr =
            std::env::var("ENCORE_ADVERTISE").unwrap_or_else(|_| http_addr.clone());
        let advertise_https = std::env::var("ENCORE_ADVERTISE_HTTPS")
            .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let capture_path = std::env::var("ENCORE_CAPTURE")
            .map(PathBuf::from)
            .map_err(|_| "ENCORE_CAPTURE must point at a capture archive".to_string())?;
        let recording_ordinal = match std::env::var("ENCORE_RECORDING") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| format!("invalid ENCORE_RECORDING '{raw}': {e}"))?,
            Err(_) => 0,
        };
        Ok(Self {
            http_addr,
            advertise_addr,
            advertise_https,
            capture_path,
            recording_ordinal,
        })
    }
}
