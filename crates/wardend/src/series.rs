//! Series builder: reconstructs ordered time series and daily rollups
//! from the heterogeneous event log.
//!
//! The log has accumulated records from several writer generations, so
//! everything here is tolerant by construction: timestamps are resolved
//! through a documented priority order, score fields are looked up in
//! both their nested and flattened historical locations, and anything
//! unresolvable is skipped without being deleted from the store.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::WardenConfig;
use crate::store::{self, EventStore};
use warden_common::{
    DailyAggregate, DailyTable, HistorySeries, OutageMarker, PerfPoint, ScorePoint,
};

/// Numeric timestamps below this are seconds and get scaled to
/// milliseconds; at or above, they already are milliseconds.
const MS_THRESHOLD: f64 = 1e12;

/// Resolve a record's timestamp to epoch milliseconds.
///
/// Priority order:
/// 1. numeric `ts`, `timestamp`, or `time` field (seconds vs. millis
///    disambiguated by [`MS_THRESHOLD`]);
/// 2. the same fields as an ISO-8601 string;
/// 3. the caller-supplied fallback (store modification time).
///
/// `None` means the record cannot be placed on a timeline and is skipped
/// from series output.
pub fn resolve_timestamp_ms(record: &Value, fallback_ms: Option<i64>) -> Option<i64> {
    let field = ["ts", "timestamp", "time"]
        .iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()));

    match field {
        Some(value) => {
            if let Some(num) = value.as_f64() {
                if num < MS_THRESHOLD {
                    Some((num * 1000.0) as i64)
                } else {
                    Some(num as i64)
                }
            } else if let Some(text) = value.as_str() {
                parse_iso_ms(text).or(fallback_ms)
            } else {
                fallback_ms
            }
        }
        None => fallback_ms,
    }
}

fn parse_iso_ms(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    // Older writers recorded naive local-less timestamps without an
    // offset; read them as UTC.
    let trimmed = text.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Health score lookup across writer generations, first match wins:
/// 1. `report.score.wifi_health_score` (generator payload, nested);
/// 2. `report.wifi_health_score` (early generator payloads, flattened);
/// 3. `score_report.wifi_health_score` (locally computed report).
pub fn resolve_score(record: &Value) -> Option<f64> {
    record
        .pointer("/report/score/wifi_health_score")
        .or_else(|| record.pointer("/report/wifi_health_score"))
        .or_else(|| record.pointer("/score_report/wifi_health_score"))
        .and_then(Value::as_f64)
}

/// Performance sub-object lookup: generator payload first, then the
/// speed test embedded in the local score report.
fn resolve_performance(record: &Value) -> Option<&Value> {
    record
        .pointer("/report/performance")
        .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))
        .or_else(|| {
            record
                .pointer("/score_report/speedtest")
                .filter(|v| v.as_object().is_some_and(|m| !m.is_empty()))
        })
}

/// Records ordered by resolved timestamp. Heartbeats and the monitor's
/// own outage records never participate in series construction; the
/// physical write order is not trusted because monitor and scheduler
/// append concurrently.
fn resolved_items(records: &[Value], fallback_ms: Option<i64>) -> Vec<(i64, &Value)> {
    let mut items: Vec<(i64, &Value)> = records
        .iter()
        .filter(|record| {
            !matches!(
                record.get("type").and_then(Value::as_str),
                Some("heartbeat") | Some("outage")
            )
        })
        .filter_map(|record| {
            match resolve_timestamp_ms(record, fallback_ms) {
                Some(ts) => Some((ts, record)),
                None => {
                    debug!("Skipping record with unresolvable timestamp");
                    None
                }
            }
        })
        .collect();

    // Stable sort: equal timestamps keep physical order.
    items.sort_by_key(|(ts, _)| *ts);
    items
}

fn build_series(items: &[(i64, &Value)]) -> HistorySeries {
    let mut series = HistorySeries::default();

    for &(ts, record) in items {
        if let Some(score) = resolve_score(record) {
            series.score_series.push(ScorePoint { ts, score });
        }

        if let Some(perf) = resolve_performance(record) {
            series.perf_series.push(PerfPoint {
                ts,
                download_mbps: perf.get("download_mbps").and_then(Value::as_f64),
                upload_mbps: perf.get("upload_mbps").and_then(Value::as_f64),
                ping_ms: perf.get("ping_ms").and_then(Value::as_f64),
            });
        }

        // Secondary outage channel: flagged inside a report payload.
        // Intentionally separate from the monitor's outage log.
        if record
            .pointer("/report/outage_detected")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let reason = record
                .pointer("/report/outage_reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            series.outage_events.push(OutageMarker { ts, reason });
        }
    }

    series
}

fn build_daily(items: &[(i64, &Value)]) -> DailyTable {
    let mut sums: BTreeMap<chrono::NaiveDate, (u64, f64)> = BTreeMap::new();

    for &(ts, record) in items {
        let Some(score) = resolve_score(record) else {
            continue;
        };
        let Some(day) = Utc.timestamp_millis_opt(ts).single().map(|dt| dt.date_naive()) else {
            continue;
        };
        let entry = sums.entry(day).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += score;
    }

    sums.into_iter()
        .map(|(day, (count, sum))| {
            let avg = (sum / count as f64 * 100.0).round() / 100.0;
            (
                day,
                DailyAggregate {
                    count,
                    avg_score: avg,
                },
            )
        })
        .collect()
}

/// Build all derived output from raw records. Deterministic: the same
/// records and fallback always produce identical output.
pub fn build(records: &[Value], fallback_ms: Option<i64>) -> (HistorySeries, DailyTable) {
    let items = resolved_items(records, fallback_ms);
    (build_series(&items), build_daily(&items))
}

/// Re-derive every series from the store and persist them atomically for
/// the presentation layer.
pub fn rebuild_and_persist(store: &EventStore, config: &WardenConfig) -> anyhow::Result<()> {
    let records = store.load_raw();
    let (series, daily) = build(&records, store.modified_ms());

    store::write_json_atomic(&config.series_path(), &series)?;
    store::write_json_atomic(&config.daily_path(), &daily)?;

    info!(
        "Series rebuilt: {} score points, {} perf points, {} outage markers, {} days",
        series.score_series.len(),
        series.perf_series.len(),
        series.outage_events.len(),
        daily.len()
    );
    Ok(())
}
