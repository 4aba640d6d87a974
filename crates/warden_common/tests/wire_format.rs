//! Wire-format compatibility tests for the event log record types.
//!
//! The log outlives any single daemon version, so these pin the `type`
//! tag, tolerate records written by older writers, and keep the field
//! names external consumers resolve by hand.

use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use warden_common::{
    BandCounts, EventRecord, FiveGhzBlocks, ScanSnapshot, ScoreReport, SnapshotEvent,
};

#[test]
fn heartbeat_line_from_an_old_writer_still_decodes() {
    // Extra fields and a missing ssid, as early versions wrote them.
    let line = r#"{"type":"heartbeat","ts":"2025-11-02T09:30:00+00:00","ok":true,"seq":991}"#;
    let record: EventRecord = serde_json::from_str(line).unwrap();
    assert_eq!(record.type_name(), "heartbeat");
}

#[test]
fn snapshot_line_with_only_a_scan_decodes() {
    let line = json!({
        "type": "snapshot",
        "ts": "2026-03-01T10:00:00Z",
        "scan": {
            "captured_at": "2026-03-01T10:00:00Z",
            "platform": "macos",
            "networks": [
                { "ssid": "Cafe", "channel": "11 (2GHz, 20MHz)", "rssi_dbm": -71 },
                { "channel": "36" }
            ]
        }
    })
    .to_string();

    let record: EventRecord = serde_json::from_str(&line).unwrap();
    let snap = record.as_snapshot().unwrap();
    assert_eq!(snap.scan.networks.len(), 2);
    assert!(snap.score_report.is_none());
    assert!(snap.report.is_none());
}

#[test]
fn score_report_wire_names_are_what_consumers_resolve() {
    let report: ScoreReport = serde_json::from_value(json!({
        "total_networks": 4,
        "band_counts": { "2.4": 3, "5": 1 },
        "channel_counts_24": { "1": 1, "6": 2 },
        "channel_counts_5": { "149": 1 },
        "block_counts_5": { "149-161": 1 },
        "wifi_health_score": 82
    }))
    .unwrap();

    assert_eq!(report.health_score, 82);
    assert_eq!(report.band_counts.ghz24, 3);
    assert_eq!(report.block_counts_5.high, 1);
    assert_eq!(report.channel_counts_24.get(&6), Some(&2));
    assert!(report.speedtest.is_none());
}

#[test]
fn snapshot_with_channel_counts_survives_a_typed_roundtrip() {
    // The `type` tag makes serde buffer the record before dispatching,
    // which only preserves string map keys. A snapshot carrying per-channel
    // counts must still decode back into the typed record.
    let now = Utc::now();
    let record = EventRecord::Snapshot(SnapshotEvent {
        ts: now,
        scan: ScanSnapshot::empty(now, "linux"),
        score_report: Some(ScoreReport {
            total_networks: 3,
            band_counts: BandCounts { ghz24: 2, ghz5: 1 },
            channel_counts_24: BTreeMap::from([(6, 2), (11, 1)]),
            channel_counts_5: BTreeMap::from([(36, 1)]),
            block_counts_5: FiveGhzBlocks {
                low: 1,
                ..Default::default()
            },
            health_score: 90,
            speedtest: None,
        }),
        trend: None,
        report: None,
    });

    let line = serde_json::to_string(&record).unwrap();
    let back: EventRecord = serde_json::from_str(&line).unwrap();
    let report = back.as_snapshot().unwrap().score_report.as_ref().unwrap();
    assert_eq!(report.channel_counts_24.get(&6), Some(&2));
    assert_eq!(report.channel_counts_24.get(&11), Some(&1));
    assert_eq!(report.channel_counts_5.get(&36), Some(&1));
}

#[test]
fn unknown_record_type_is_an_error_not_a_panic() {
    let line = r#"{"type":"comet_sighting","ts":1}"#;
    assert!(serde_json::from_str::<EventRecord>(line).is_err());
}
