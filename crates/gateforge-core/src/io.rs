// crates/gateforge-core/src/io.rs
// ============================================================================
// Module: GateForge Artifact I/O
// Description: Atomic JSON artifact writes and advisory-locked JSONL ledger
//              appends.
// Purpose: Ensure every artifact a command writes is either fully present or
//          absent on disk, and that concurrent appenders never tear a line.
// Dependencies: fs2, serde, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Commands never write an artifact in place: they serialize to a temporary
//! file in the destination directory and rename it into place, so a reader
//! racing a writer always sees either the old artifact or the new one, never
//! a partial write. Ledger and audit-log rows append through an advisory
//! [`fs2`] file lock, because independent CLI invocations (not just threads
//! within one process) may append concurrently.

use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::CoreError;

/// Reads and parses a JSON artifact from `path`.
///
/// # Errors
///
/// Returns [`CoreError::Io`] when the file cannot be read, or
/// [`CoreError::InvalidArtifact`] when the contents are not valid JSON for
/// `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let bytes = std::fs::read(path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|err| CoreError::InvalidArtifact {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Serializes `value` to pretty JSON and atomically replaces the file at
/// `path` with the result.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArtifact`] if serialization fails, or
/// [`CoreError::Io`] if the temporary file cannot be created, written, or
/// persisted.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let payload = serde_json::to_vec_pretty(value).map_err(|err| CoreError::InvalidArtifact {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    temp.write_all(&payload).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    temp.flush().map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    temp.persist(path).map_err(|err| CoreError::Io {
        path: path.display().to_string(),
        source: err.error,
    })?;
    Ok(())
}

/// Appends a single JSON-serialized line to the ledger file at `path`,
/// creating it if necessary, serializing concurrent writers (including
/// writers in other processes) through an advisory exclusive lock so a
/// crash or interleaved write can never tear a line.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be opened or written, or
/// [`CoreError::Lock`] if the advisory lock cannot be acquired.
pub fn append_jsonl_line<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).map_err(|source| {
        CoreError::Io {
            path: path.display().to_string(),
            source,
        }
    })?;
    file.lock_exclusive().map_err(|source| CoreError::Lock {
        path: path.display().to_string(),
        source,
    })?;
    let result = (|| -> Result<(), CoreError> {
        let line = serde_json::to_string(value).map_err(|err| CoreError::InvalidArtifact {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        writeln!(file, "{line}").map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        file.flush().map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })
    })();
    let _ = fs2::FileExt::unlock(&file);
    result
}

/// Reads every line of a JSONL ledger, parsing each as `T`.
///
/// Lines that fail to parse are skipped rather than aborting the whole read,
/// matching the ledger's append-only, best-effort-tolerant reading contract.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be opened.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let Ok(line) = line else {
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<T>(&line) {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde::Serialize;
    use tempfile::tempdir;

    use super::append_jsonl_line;
    use super::read_jsonl;
    use super::read_json;
    use super::write_json_atomic;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Row {
        n: u32,
    }

    #[test]
    fn atomic_write_then_read_round_trips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("artifact.json");
        write_json_atomic(&path, &Row { n: 7 }).expect("write");
        let read_back: Row = read_json(&path).expect("read");
        assert_eq!(read_back, Row { n: 7 });
    }

    #[test]
    fn jsonl_append_preserves_order_and_skips_garbage() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ledger.jsonl");
        append_jsonl_line(&path, &Row { n: 1 }).expect("append 1");
        append_jsonl_line(&path, &Row { n: 2 }).expect("append 2");
        std::fs::write(
            dir.path().join("scratch"),
            "unrelated file should not affect ledger reads",
        )
        .expect("scratch write");
        let rows: Vec<Row> = read_jsonl(&path).expect("read");
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
    }

    #[test]
    fn missing_ledger_reads_as_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing.jsonl");
        let rows: Vec<Row> = read_jsonl(&path).expect("read");
        assert!(rows.is_empty());
    }
}
