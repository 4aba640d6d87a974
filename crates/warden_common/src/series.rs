//! Derived time-series and daily aggregate structures.
//!
//! These are rebuilt from the event log at any time and hold no state of
//! their own. Timestamps are epoch milliseconds after resolution, and all
//! series are ordered ascending by timestamp.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One health-score sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub ts: i64,
    pub score: f64,
}

/// One performance sample. Individual fields may be absent when the
/// source record carried only a partial speed test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfPoint {
    pub ts: i64,
    #[serde(default)]
    pub download_mbps: Option<f64>,
    #[serde(default)]
    pub upload_mbps: Option<f64>,
    #[serde(default)]
    pub ping_ms: Option<f64>,
}

/// An outage flagged inside a report payload. This is a secondary channel
/// separate from the monitor's own outage log; the two are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutageMarker {
    pub ts: i64,
    pub reason: String,
}

/// The three series the presentation layer charts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub score_series: Vec<ScorePoint>,
    pub perf_series: Vec<PerfPoint>,
    pub outage_events: Vec<OutageMarker>,
}

/// Per-calendar-day rollup of score-bearing records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub count: u64,
    /// Mean health score for the day, rounded to 2 decimal places.
    pub avg_score: f64,
}

/// Daily table keyed by UTC calendar date. BTreeMap keeps output order
/// and serialization deterministic across rebuilds.
pub type DailyTable = BTreeMap<NaiveDate, DailyAggregate>;
