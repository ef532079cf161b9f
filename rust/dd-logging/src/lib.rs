//! dd-logging: NDJSON session events + debug tracing.
//!
//! Append-only NDJSON logs for post-mortems of a peer session: one line per
//! message sent, received or dropped, plus phase changes and the final result.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event log schema version.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Environment switch for stderr debug tracing.
pub const DEBUG_ENV: &str = "DD_DEBUG_LOG";

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    d.as_millis() as u64
}

pub fn hash_config_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Schema versioning fields carried by every event.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfoV1 {
    pub schema_version: u32,
    pub protocol_version: u32,
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStartEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub room_id: String,
    pub player_id: String,
    pub player_no: u8,
    pub config_hash: Option<String>,
}

/// One protocol message crossing the transport (`msg_out` / `msg_in`).
#[derive(Debug, Clone, Serialize)]
pub struct MessageEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub player_id: String,

    pub kind: &'static str,
    pub round: u8,
    pub body: serde_json::Value,
}

/// An inbound message ignored by reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct MessageDroppedEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub player_id: String,

    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub player_id: String,

    pub from: &'static str,
    pub to: &'static str,
    pub round: u8,
    pub current_player: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameOverEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub player_id: String,

    pub winner: u8,
    pub totals: [u32; 2],
}

#[derive(Debug)]
pub enum NdjsonError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for NdjsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NdjsonError::Io(e) => write!(f, "event log io error: {e}"),
            NdjsonError::Json(e) => write!(f, "event log json error: {e}"),
        }
    }
}

impl std::error::Error for NdjsonError {}

impl From<io::Error> for NdjsonError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for NdjsonError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

impl Drop for NdjsonWriter {
    fn drop(&mut self) {
        let _ = self.w.flush();
    }
}

static DEBUG_FORCED: AtomicBool = AtomicBool::new(false);

/// Turn on debug tracing regardless of the environment (config `logging.debug_log`).
pub fn force_debug() {
    DEBUG_FORCED.store(true, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    DEBUG_FORCED.load(Ordering::Relaxed)
        || *ON.get_or_init(|| {
            matches!(std::env::var(DEBUG_ENV).as_deref(), Ok("1" | "true" | "yes"))
        })
}

/// One JSON line on stderr when debug tracing is on.
pub fn debug_log(location: &str, message: &str, data: serde_json::Value) {
    if !debug_enabled() {
        return;
    }
    let payload = serde_json::json!({
        "timestamp": now_ms(),
        "location": location,
        "message": message,
        "data": data,
    });
    if let Ok(line) = serde_json::to_string(&payload) {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use serde_json::Value;

    fn read_ndjson_lenient(path: &Path) -> Vec<Value> {
        let s = fs::read_to_string(path).expect("read");
        s.lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str::<Value>(l).ok())
            .collect()
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn writes_one_valid_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut w = NdjsonWriter::open_append(&path).unwrap();

        w.write_event(&MessageEventV1 {
            event: "msg_out",
            ts_ms: now_ms(),
            player_id: "p1".to_string(),
            kind: "ready",
            round: 1,
            body: serde_json::json!({"isReady": true}),
        })
        .unwrap();
        w.write_event(&MessageDroppedEventV1 {
            event: "msg_dropped",
            ts_ms: now_ms(),
            player_id: "p1".to_string(),
            kind: "ready",
            reason: "stale".to_string(),
        })
        .unwrap();
        w.flush().unwrap();

        let vals = read_ndjson_lenient(&path);
        assert_eq!(vals.len(), 2);
        assert_eq!(vals[0]["event"], "msg_out");
        assert_eq!(vals[0]["body"]["isReady"], true);
        assert_eq!(vals[1]["reason"], "stale");
    }

    #[test]
    fn periodic_flush_makes_lines_visible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut w = NdjsonWriter::open_append_with_flush(&path, 1).unwrap();
        w.write_event(&GameOverEventV1 {
            event: "game_over",
            ts_ms: 1,
            player_id: "p2".to_string(),
            winner: 2,
            totals: [180, 211],
        })
        .unwrap();

        // No explicit flush, writer still alive.
        let vals = read_ndjson_lenient(&path);
        assert_eq!(vals.len(), 1);
        assert_eq!(vals[0]["totals"][1], 211);
        drop(w);
    }

    #[test]
    fn lenient_reader_tolerates_trailing_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");

        {
            let mut w = NdjsonWriter::open_append(&path).unwrap();
            w.write_event(&PhaseEventV1 {
                event: "phase",
                ts_ms: 1,
                player_id: "p1".to_string(),
                from: "waiting",
                to: "playing",
                round: 1,
                current_player: 1,
            })
            .unwrap();
        }

        // Simulate crash: append a partial JSON line (no newline, invalid JSON).
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(br#"{"event":"phase","to":"#).unwrap();
        f.flush().unwrap();

        let vals = read_ndjson_lenient(&path);
        assert_eq!(vals.len(), 1);
        assert_eq!(vals[0]["to"], "playing");
    }

    #[test]
    fn config_hash_is_stable_hex() {
        let a = hash_config_bytes(b"roll:\n  default_duration_ms: 2000\n");
        let b = hash_config_bytes(b"roll:\n  default_duration_ms: 2000\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_config_bytes(b""));
    }
}
