//! Append-only event store.
//!
//! One JSONL file, one complete record per line. Appends take an internal
//! lock so concurrent writers (monitor and scheduler) never interleave
//! partial records. Records are never rewritten or deleted; readers skip
//! unparseable lines and keep going.

use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use warden_common::{EventRecord, SnapshotEvent};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open event log {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write event record: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to serialize event record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The single source of truth for everything the daemon observes.
pub struct EventStore {
    path: PathBuf,
    /// Serializes appends so each record lands as one atomic line.
    append_lock: Mutex<()>,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Open {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self {
            path,
            append_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single complete JSON line.
    pub fn append(&self, record: &EventRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;

        let _guard = self.append_lock.lock().unwrap_or_else(|e| e.into_inner());

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::Open {
                path: self.path.clone(),
                source,
            })?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        debug!("Appended {} record to {}", record.type_name(), self.path.display());
        Ok(())
    }

    /// Load every record as raw JSON, skipping unparseable lines.
    /// A missing or unreadable log is an empty history, not an error.
    pub fn load_raw(&self) -> Vec<Value> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to open {}: {}. Treating as empty.", self.path.display(), e);
                return Vec::new();
            }
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!("Skipping unreadable line {}: {}", line_num + 1, e);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => records.push(value),
                Err(e) => {
                    warn!("Skipping unparseable line {}: {}", line_num + 1, e);
                }
            }
        }

        records
    }

    /// Load the typed snapshot events, in physical (insertion) order.
    /// Lines that are not snapshots, or that fail typed decoding, are
    /// skipped; the delta engine only needs the well-formed ones.
    pub fn load_snapshots(&self) -> Vec<SnapshotEvent> {
        self.load_raw()
            .into_iter()
            .filter(|value| value.get("type").and_then(Value::as_str) == Some("snapshot"))
            .filter_map(|value| match serde_json::from_value::<EventRecord>(value) {
                Ok(EventRecord::Snapshot(snap)) => Some(snap),
                Ok(_) => None,
                Err(e) => {
                    warn!("Skipping undecodable snapshot record: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Log file modification time in epoch milliseconds, used as the
    /// timestamp fallback of last resort for records with none of their
    /// own.
    pub fn modified_ms(&self) -> Option<i64> {
        let mtime = std::fs::metadata(&self.path).ok()?.modified().ok()?;
        let since_epoch = mtime.duration_since(std::time::UNIX_EPOCH).ok()?;
        Some(since_epoch.as_millis() as i64)
    }
}

/// Write a JSON document via temp file + rename so readers never observe
/// a partially written file.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    use anyhow::Context;

    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, json)
        .with_context(|| format!("failed to write {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename to {}", path.display()))?;

    Ok(())
}
