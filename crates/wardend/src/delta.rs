//! Delta engine: signed trend between the two most recent scans.
//!
//! The previous side always comes from a persisted snapshot event, so
//! once the current scan is appended the trend it carries is exactly the
//! comparison of the two newest records in the history log.

use warden_common::{ScanSnapshot, SnapshotEvent, TrendDelta};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compare two scans, current minus previous. Positive download/upload
/// deltas mean faster; a positive ping delta means worse latency.
pub fn compare(prev: &ScanSnapshot, curr: &ScanSnapshot) -> TrendDelta {
    let (prev_down, prev_up, prev_ping) = prev.speed_fields();
    let (curr_down, curr_up, curr_ping) = curr.speed_fields();

    TrendDelta {
        download_delta_mbps: round2(curr_down - prev_down),
        upload_delta_mbps: round2(curr_up - prev_up),
        ping_delta_ms: round2(curr_ping - prev_ping),
        networks_delta: curr.networks.len() as i64 - prev.networks.len() as i64,
    }
}

/// Trend for a scan that is about to be persisted, against the most
/// recent snapshot already in the log (latest timestamp, ties broken by
/// insertion order). `None` when no history exists, so callers can tell
/// "no change" from "no data".
pub fn trend_against_latest(
    snapshots: &[SnapshotEvent],
    current: &ScanSnapshot,
) -> Option<TrendDelta> {
    // max_by_key returns the last of equal maxima, i.e. the most
    // recently appended record.
    let prev = snapshots.iter().max_by_key(|snap| snap.ts)?;
    Some(compare(&prev.scan, current))
}
