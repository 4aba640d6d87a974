//! End-to-end pipeline tests: probe -> store -> scoring -> series.
//!
//! Exercises the daemon's components together against a real on-disk
//! event log, with fake probe and report-generator seams.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use warden_common::{NetworkObservation, ScanSnapshot, SpeedResult};
use wardend::config::WardenConfig;
use wardend::monitor::{Clock, OutageMonitor};
use wardend::probe::Probe;
use wardend::report::{ReportGenerator, ReportRequest};
use wardend::scheduler::{JobScheduler, Jobs};
use wardend::series;
use wardend::store::EventStore;

struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    fn advance_secs(&self, secs: i64) {
        *self.now.lock().unwrap() += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Probe whose successive scans get one network busier and slightly
/// slower, so trends have a direction.
struct DegradingProbe {
    scans: AtomicUsize,
}

impl DegradingProbe {
    fn new() -> Self {
        Self {
            scans: AtomicUsize::new(0),
        }
    }
}

impl Probe for DegradingProbe {
    fn probe_connectivity(&self) -> bool {
        true
    }

    fn current_ssid(&self) -> Option<String> {
        Some("PipelineNet".into())
    }

    fn scan(&self, with_speedtest: bool) -> Result<ScanSnapshot> {
        let n = self.scans.fetch_add(1, Ordering::SeqCst);
        let networks = (0..=n)
            .map(|i| NetworkObservation {
                ssid: Some(format!("neighbor-{}", i)),
                channel: "6 (2GHz, 20MHz)".into(),
                rssi_dbm: Some(-60 - i as i32),
                security: Some("WPA2".into()),
            })
            .collect();
        Ok(ScanSnapshot {
            captured_at: Utc::now(),
            platform: "test".into(),
            networks,
            speedtest: with_speedtest.then(|| SpeedResult {
                download_mbps: Some(100.0 - 10.0 * n as f64),
                upload_mbps: Some(20.0),
                ping_ms: Some(15.0 + 5.0 * n as f64),
            }),
        })
    }
}

struct EchoGenerator;

impl ReportGenerator for EchoGenerator {
    fn generate(&self, request: &ReportRequest<'_>) -> Result<String> {
        Ok(format!(
            "{{\"score\": {{\"wifi_health_score\": {}}}, \"performance\": {{\"download_mbps\": {}}}}}",
            request.score_report.health_score,
            request
                .scan
                .speedtest
                .as_ref()
                .and_then(|sp| sp.download_mbps)
                .unwrap_or(0.0)
        ))
    }
}

fn test_config(dir: &TempDir) -> Arc<WardenConfig> {
    Arc::new(WardenConfig {
        data_dir: dir.path().to_path_buf(),
        scan_interval_secs: 60,
        optimize_interval_secs: 600,
        ..WardenConfig::default()
    })
}

#[tokio::test]
async fn scheduler_ticks_fire_jobs_at_due_times() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let store = Arc::new(EventStore::new(config.history_path()).unwrap());
    let clock = ManualClock::starting_at("2026-03-01T00:00:00Z".parse().unwrap());

    let jobs = Arc::new(Jobs::new(
        Arc::clone(&config),
        Arc::clone(&store),
        Arc::new(DegradingProbe::new()),
        Arc::new(EchoGenerator),
        clock.clone(),
    ));
    let mut scheduler = JobScheduler::new(jobs, &config, clock.clone());

    // First tick: both jobs due immediately -> light + heavy snapshots.
    scheduler.tick().await;
    assert_eq!(store.load_snapshots().len(), 2);

    // Thirty seconds later nothing is due.
    clock.advance_secs(30);
    scheduler.tick().await;
    assert_eq!(store.load_snapshots().len(), 2);

    // Past the light interval, only the light job fires.
    clock.advance_secs(40);
    scheduler.tick().await;
    assert_eq!(store.load_snapshots().len(), 3);

    // Past the heavy interval, both fire again.
    clock.advance_secs(600);
    scheduler.tick().await;
    assert_eq!(store.load_snapshots().len(), 5);

    let snapshots = store.load_snapshots();
    let heavy: Vec<_> = snapshots
        .iter()
        .filter(|s| s.score_report.is_some())
        .collect();
    assert_eq!(heavy.len(), 2);
    // The light job on the first tick ran before the heavy one, so even
    // the first heavy run had history to compare its scan against.
    assert!(heavy[0].trend.is_some());
    assert!(heavy[1].trend.is_some());
}

#[tokio::test]
async fn monitor_and_scheduler_share_one_log_without_losing_records() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let store = Arc::new(EventStore::new(config.history_path()).unwrap());
    let clock = ManualClock::starting_at("2026-03-01T00:00:00Z".parse().unwrap());

    let mut monitor = OutageMonitor::new(&config, Arc::clone(&store), clock.clone());
    let jobs = Jobs::new(
        Arc::clone(&config),
        Arc::clone(&store),
        Arc::new(DegradingProbe::new()),
        Arc::new(EchoGenerator),
        clock.clone(),
    );

    // Interleave monitor ticks with scheduler jobs, including a full
    // outage (confirmed after 15s of failure, open for 30s).
    for record in monitor.observe(true, Some("PipelineNet".into())) {
        store.append(&record).unwrap();
    }
    jobs.run_heavy().await.unwrap();

    for _ in 0..4 {
        clock.advance_secs(10);
        for record in monitor.observe(false, None) {
            store.append(&record).unwrap();
        }
    }
    jobs.run_light().await.unwrap();

    clock.advance_secs(10);
    for record in monitor.observe(true, None) {
        store.append(&record).unwrap();
    }

    let raw = store.load_raw();
    let heartbeats = raw.iter().filter(|r| r["type"] == "heartbeat").count();
    let outages = raw.iter().filter(|r| r["type"] == "outage").count();
    let snapshots = raw.iter().filter(|r| r["type"] == "snapshot").count();

    assert_eq!(heartbeats, 6, "one heartbeat per poll, none dropped");
    assert_eq!(outages, 1, "the confirmed outage closed long enough to report");
    assert_eq!(snapshots, 2);

    // The outage record carries the carried-forward SSID.
    let outage = raw.iter().find(|r| r["type"] == "outage").unwrap();
    assert_eq!(outage["ssid_at_time"], "PipelineNet");
    assert_eq!(outage["kind"], "internet_down");
}

#[tokio::test]
async fn derived_series_rebuild_is_idempotent_on_disk() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let store = Arc::new(EventStore::new(config.history_path()).unwrap());
    let clock = ManualClock::starting_at("2026-03-01T00:00:00Z".parse().unwrap());

    let jobs = Jobs::new(
        Arc::clone(&config),
        Arc::clone(&store),
        Arc::new(DegradingProbe::new()),
        Arc::new(EchoGenerator),
        clock.clone(),
    );

    for _ in 0..3 {
        jobs.run_heavy().await.unwrap();
        clock.advance_secs(3600);
    }

    let series_first = std::fs::read_to_string(config.series_path()).unwrap();
    let daily_first = std::fs::read_to_string(config.daily_path()).unwrap();

    // Rebuilding over an unchanged store must be byte-identical.
    series::rebuild_and_persist(&store, &config).unwrap();
    assert_eq!(std::fs::read_to_string(config.series_path()).unwrap(), series_first);
    assert_eq!(std::fs::read_to_string(config.daily_path()).unwrap(), daily_first);

    // Score series reflects the generator payload and stays sorted.
    let series: serde_json::Value = serde_json::from_str(&series_first).unwrap();
    let points = series["score_series"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    let ts: Vec<i64> = points.iter().map(|p| p["ts"].as_i64().unwrap()).collect();
    let mut sorted = ts.clone();
    sorted.sort_unstable();
    assert_eq!(ts, sorted);

    let daily: serde_json::Value = serde_json::from_str(&daily_first).unwrap();
    let day = &daily["2026-03-01"];
    assert_eq!(day["count"], 3);
}

#[tokio::test]
async fn appended_monitor_records_never_break_series_rebuild() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let store = Arc::new(EventStore::new(config.history_path()).unwrap());
    let clock = ManualClock::starting_at("2026-03-01T00:00:00Z".parse().unwrap());

    let mut monitor = OutageMonitor::new(&config, Arc::clone(&store), clock.clone());
    for ok in [true, false, true] {
        for record in monitor.observe(ok, None) {
            store.append(&record).unwrap();
        }
        clock.advance_secs(5);
    }

    series::rebuild_and_persist(&store, &config).unwrap();
    let series: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(config.series_path()).unwrap()).unwrap();
    assert!(series["score_series"].as_array().unwrap().is_empty());
    assert!(series["perf_series"].as_array().unwrap().is_empty());
}
