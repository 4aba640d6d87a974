//! Typed records of the append-only event log.
//!
//! Every line in the history file is one of these, tagged by a `type`
//! field. Consumers must tolerate unknown extra fields and records written
//! by older versions, so deserialization stays permissive throughout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::{ScoreReport, TrendDelta};
use crate::scan::ScanSnapshot;

/// Outage kind written by the monitor. There is only one today, but the
/// field is free text on the wire so new kinds never break old readers.
pub const OUTAGE_KIND_INTERNET_DOWN: &str = "internet_down";

/// One liveness record per connectivity poll cycle, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub ts: DateTime<Utc>,
    pub ok: bool,
    #[serde(default)]
    pub ssid: Option<String>,
}

/// A confirmed, closed outage. Only written when the outage lasted at
/// least the configured minimum duration; shorter blips are discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutageEvent {
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub duration_sec: f64,
    #[serde(default)]
    pub ssid_at_time: Option<String>,
    pub kind: String,
}

/// One scheduler job run: the scan it captured, plus scoring output when
/// the heavy job produced any. `report` is the opaque payload returned by
/// the external report generator and is never interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub ts: DateTime<Utc>,
    pub scan: ScanSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_report: Option<ScoreReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
}

/// A single log record, tagged on the wire as
/// `"heartbeat" | "outage" | "snapshot"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRecord {
    Heartbeat(HeartbeatEvent),
    Outage(OutageEvent),
    Snapshot(SnapshotEvent),
}

impl EventRecord {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Heartbeat(_) => "heartbeat",
            Self::Outage(_) => "outage",
            Self::Snapshot(_) => "snapshot",
        }
    }

    pub fn as_snapshot(&self) -> Option<&SnapshotEvent> {
        match self {
            Self::Snapshot(snap) => Some(snap),
            _ => None,
        }
    }
}
