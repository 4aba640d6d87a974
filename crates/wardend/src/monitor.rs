//! Outage monitor: connectivity polling with debounce and hysteresis.
//!
//! A three-state machine (`Up` → `Failing` → `Outage`) driven by one
//! connectivity probe per poll tick. A failure span shorter than the
//! confirmation window never opens an outage, and a confirmed outage
//! shorter than the minimum duration closes silently. Every tick emits a
//! heartbeat record regardless of state; no record is ever rewritten.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::WardenConfig;
use crate::probe::{self, Probe};
use crate::store::EventStore;
use warden_common::{
    events::OUTAGE_KIND_INTERNET_DOWN, EventRecord, HeartbeatEvent, OutageEvent,
};

/// Time source seam so state transitions are testable without real time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used by the daemon.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Connectivity state of the monitored link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    /// Probe failing but not failing long enough to count as an outage.
    Failing,
    /// Confirmed outage, open since the contained instant.
    Outage { since: DateTime<Utc> },
}

pub struct OutageMonitor {
    state: LinkState,
    last_ok: DateTime<Utc>,
    last_ssid: Option<String>,
    outage_start: Duration,
    outage_min_duration: Duration,
    poll_interval: std::time::Duration,
    clock: Arc<dyn Clock>,
    store: Arc<EventStore>,
}

impl OutageMonitor {
    pub fn new(config: &WardenConfig, store: Arc<EventStore>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            state: LinkState::Up,
            last_ok: now,
            last_ssid: None,
            outage_start: Duration::seconds(config.outage_start_secs as i64),
            outage_min_duration: Duration::seconds(config.outage_min_duration_secs as i64),
            poll_interval: config.ping_interval(),
            clock,
            store,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Transition guard: the link has been failing continuously for at
    /// least the confirmation window.
    fn failure_confirmed(&self, now: DateTime<Utc>) -> bool {
        now - self.last_ok >= self.outage_start
    }

    /// Closing guard: only outages at least the minimum duration long are
    /// worth reporting; anything shorter is a blip.
    fn worth_reporting(&self, duration: Duration) -> bool {
        duration >= self.outage_min_duration
    }

    /// Feed one poll result through the state machine. Returns the
    /// records to append for this tick: possibly a closed outage, always
    /// exactly one heartbeat.
    pub fn observe(&mut self, ok: bool, ssid: Option<String>) -> Vec<EventRecord> {
        let now = self.clock.now();

        // Opportunistic SSID refresh for outage attribution; an
        // unreadable SSID keeps the previous observation rather than
        // resetting to unknown. Heartbeats record the raw per-tick
        // reading untouched.
        if ssid.is_some() {
            self.last_ssid = ssid.clone();
        }

        let mut records = Vec::with_capacity(2);

        if ok {
            if let LinkState::Outage { since } = self.state {
                let duration = now - since;
                if self.worth_reporting(duration) {
                    let duration_sec =
                        (duration.num_milliseconds() as f64 / 1000.0 * 100.0).round() / 100.0;
                    info!(
                        "Outage ended after {:.2}s (started {})",
                        duration_sec,
                        since.to_rfc3339()
                    );
                    records.push(EventRecord::Outage(OutageEvent {
                        ts_start: since,
                        ts_end: now,
                        duration_sec,
                        ssid_at_time: self.last_ssid.clone(),
                        kind: OUTAGE_KIND_INTERNET_DOWN.to_string(),
                    }));
                } else {
                    debug!("Discarding {}s blip", duration.num_seconds());
                }
            }
            self.state = LinkState::Up;
            self.last_ok = now;
        } else {
            match self.state {
                LinkState::Up => {
                    debug!("Connectivity probe failed; watching for confirmation");
                    self.state = LinkState::Failing;
                }
                LinkState::Failing if self.failure_confirmed(now) => {
                    warn!("Outage confirmed at {}", now.to_rfc3339());
                    self.state = LinkState::Outage { since: now };
                }
                LinkState::Failing | LinkState::Outage { .. } => {}
            }
        }

        records.push(EventRecord::Heartbeat(HeartbeatEvent { ts: now, ok, ssid }));

        records
    }

    /// Poll loop. Exits after the current iteration once `shutdown` is
    /// set; an in-flight probe call is never interrupted.
    pub async fn run(mut self, probe: Arc<dyn Probe>, shutdown: Arc<AtomicBool>) {
        info!(
            "Outage monitor running (poll every {}s)",
            self.poll_interval.as_secs()
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !shutdown.load(Ordering::Relaxed) {
            ticker.tick().await;
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let ok = probe::connectivity_check(Arc::clone(&probe)).await;
            let ssid = probe::ssid_lookup(Arc::clone(&probe)).await;

            for record in self.observe(ok, ssid) {
                if let Err(e) = self.store.append(&record) {
                    error!("Failed to append {} record: {}", record.type_name(), e);
                }
            }
        }

        info!("Outage monitor stopped");
    }
}
