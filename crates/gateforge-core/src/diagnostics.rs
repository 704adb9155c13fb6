// crates/gateforge-core/src/diagnostics.rs
// ============================================================================
// Module: GateForge Diagnostics
// Description: Structured JSONL event sink for CLI audit trails.
// Purpose: Emit one JSON object per line describing a pipeline decision
//          without coupling every command to a concrete output target.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Diagnostics are distinct from ordinary `tracing` log lines: a diagnostic
//! event is a durable, structured record of a decision a command made (a
//! checker verdict, a policy overlay reason, a planner rejection) that a
//! downstream tool may want to parse. Log lines are for humans watching a
//! terminal; diagnostics are for the `--audit` sink.

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use fs2::FileExt;
use serde::Serialize;
use serde_json::Value;

use crate::time::Timestamp;

/// A single structured diagnostic event.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    /// Event kind, e.g. `"checker_verdict"` or `"policy_overlay_applied"`.
    pub event: &'static str,
    /// Wall-clock time the event was recorded.
    pub timestamp: Timestamp,
    /// Command that emitted the event, e.g. `"regress"`.
    pub command: &'static str,
    /// Free-form structured payload specific to `event`.
    pub payload: Value,
}

impl DiagnosticEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(event: &'static str, command: &'static str, payload: Value) -> Self {
        Self {
            event,
            timestamp: Timestamp::now(),
            command,
            payload,
        }
    }
}

/// Sink for diagnostic events emitted while running a command.
pub trait Diagnostics: Send + Sync {
    /// Records a diagnostic event.
    fn record(&self, event: &DiagnosticEvent);
}

/// Diagnostics sink that writes JSON lines to stderr.
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {
    fn record(&self, event: &DiagnosticEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Diagnostics sink that appends JSON lines to a file, serializing concurrent
/// writers through an advisory file lock so lines from independent CLI
/// invocations never interleave.
pub struct FileDiagnostics {
    /// Append-only file handle, guarded so a single process's writes
    /// serialize before the advisory lock is taken across processes.
    file: Mutex<std::fs::File>,
}

impl FileDiagnostics {
    /// Opens (or creates) the diagnostics log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Diagnostics for FileDiagnostics {
    fn record(&self, event: &DiagnosticEvent) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if file.lock_exclusive().is_err() {
            return;
        }
        let _ = writeln!(file, "{payload}");
        let _ = file.flush();
        let _ = fs2::FileExt::unlock(&*file);
    }
}

/// Diagnostics sink that discards every event.
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn record(&self, _event: &DiagnosticEvent) {}
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::Diagnostics;
    use super::DiagnosticEvent;
    use super::FileDiagnostics;

    #[test]
    fn file_sink_appends_one_line_per_event() {
        let file = NamedTempFile::new().expect("create temp file");
        let sink = FileDiagnostics::new(file.path()).expect("open sink");
        sink.record(&DiagnosticEvent::new("test_event", "test", json!({"n": 1})));
        sink.record(&DiagnosticEvent::new("test_event", "test", json!({"n": 2})));
        let contents = std::fs::read_to_string(file.path()).expect("read log");
        assert_eq!(contents.lines().count(), 2);
    }
}
