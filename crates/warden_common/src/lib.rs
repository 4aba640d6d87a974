//! Shared data model for the wifi-warden daemon.
//!
//! Everything that crosses a component boundary lives here: raw scan
//! snapshots from the probe adapter, the typed records of the append-only
//! event log, scoring/trend outputs, and the derived series structures
//! consumed by the presentation layer.

pub mod events;
pub mod report;
pub mod scan;
pub mod series;

pub use events::{EventRecord, HeartbeatEvent, OutageEvent, SnapshotEvent};
pub use report::{BandCounts, FiveGhzBlocks, ScoreReport, TrendDelta};
pub use scan::{NetworkObservation, ScanSnapshot, SpeedResult};
pub use series::{DailyAggregate, DailyTable, HistorySeries, OutageMarker, PerfPoint, ScorePoint};
