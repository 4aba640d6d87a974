//! Dual-interval job scheduler with mutual exclusion.
//!
//! Two independently due-timed jobs share one run guard: the frequent
//! light job (scan only) and the infrequent heavy job (speed test,
//! scoring, trend, external report). An on-demand refresh is the heavy
//! job triggered out of band. Whoever finds the guard held is skipped
//! outright and waits for its own next natural due time; nothing queues.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::WardenConfig;
use crate::delta;
use crate::monitor::Clock;
use crate::probe::{self, Probe};
use crate::report::{self, ReportGenerator, ReportRequest};
use crate::score;
use crate::series;
use crate::store::{self, EventStore};
use warden_common::{EventRecord, SnapshotEvent};

/// Result of one job invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    /// Another heavy/light operation held the run guard; not an error.
    Skipped,
}

/// Binary mutual-exclusion token shared by all heavy/light operations.
/// Acquisition is scoped: the permit releases on every exit path,
/// including panics and early returns.
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Try to take the guard. `None` means some other operation holds it.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(RunPermit {
                running: Arc::clone(&self.running),
            })
        } else {
            None
        }
    }

    pub fn is_held(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for RunGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RunGuard {
    fn clone(&self) -> Self {
        Self {
            running: Arc::clone(&self.running),
        }
    }
}

/// Scoped permit; dropping it releases the guard.
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// The scheduler's job bodies, shared so an external caller (API layer,
/// tests) can trigger a refresh against the same guard and store.
pub struct Jobs {
    config: Arc<WardenConfig>,
    store: Arc<EventStore>,
    probe: Arc<dyn Probe>,
    generator: Arc<dyn ReportGenerator>,
    guard: RunGuard,
    clock: Arc<dyn Clock>,
}

impl Jobs {
    pub fn new(
        config: Arc<WardenConfig>,
        store: Arc<EventStore>,
        probe: Arc<dyn Probe>,
        generator: Arc<dyn ReportGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            probe,
            generator,
            guard: RunGuard::new(),
            clock,
        }
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Light job: scan without a speed test, persist the snapshot,
    /// refresh the derived series.
    pub async fn run_light(&self) -> Result<JobOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(JobOutcome::Skipped);
        };

        let scan = probe::run_scan(Arc::clone(&self.probe), false).await?;
        debug!("Light scan captured {} networks", scan.networks.len());

        self.store.append(&EventRecord::Snapshot(SnapshotEvent {
            ts: self.clock.now(),
            scan,
            score_report: None,
            trend: None,
            report: None,
        }))?;

        series::rebuild_and_persist(&self.store, &self.config)?;
        Ok(JobOutcome::Completed)
    }

    /// Heavy job: scan with speed test, score, compute the trend against
    /// persisted history, ask the external generator for a narrative
    /// report, persist everything. Generator failure loses nothing: the
    /// snapshot still carries the locally computed report and trend.
    pub async fn run_heavy(&self) -> Result<JobOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Ok(JobOutcome::Skipped);
        };

        let scan = probe::run_scan(Arc::clone(&self.probe), true).await?;
        let score_report = score::analyze(&scan);
        // Trend for the scan just captured, against the newest snapshot
        // already on disk. Once this run appends its own snapshot the
        // recorded trend is the comparison of the two most recent records.
        let trend = delta::trend_against_latest(&self.store.load_snapshots(), &scan);
        info!(
            "Heavy scan: {} networks, health score {}",
            scan.networks.len(),
            score_report.health_score
        );

        // The generator call may take arbitrarily long; the guard is
        // deliberately held for its full duration so no scan overlaps a
        // slow report.
        let generator = Arc::clone(&self.generator);
        let (gen_score, gen_trend, gen_scan) = (score_report.clone(), trend, scan.clone());
        let generated = tokio::task::spawn_blocking(move || {
            let request = ReportRequest {
                score_report: &gen_score,
                trend: gen_trend.as_ref(),
                scan: &gen_scan,
            };
            generator.generate(&request)
        })
        .await;

        let report = match generated {
            Ok(Ok(raw)) => match report::clean_json_output(&raw) {
                Ok(value) => {
                    if let Err(e) =
                        store::write_json_atomic(&self.config.latest_report_path(), &value)
                    {
                        warn!("Failed to persist latest report: {:#}", e);
                    }
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding unparseable generator output: {:#}", e);
                    None
                }
            },
            Ok(Err(e)) => {
                warn!("Report generation failed: {:#}", e);
                None
            }
            Err(e) => {
                warn!("Report generation task failed: {}", e);
                None
            }
        };

        self.store.append(&EventRecord::Snapshot(SnapshotEvent {
            ts: self.clock.now(),
            scan,
            score_report: Some(score_report),
            trend,
            report,
        }))?;

        series::rebuild_and_persist(&self.store, &self.config)?;
        Ok(JobOutcome::Completed)
    }

    /// On-demand equivalent of the heavy job, for callers outside the
    /// scheduler loop. Subject to the same guard: returns `Skipped`
    /// instead of waiting when an operation is already running.
    pub async fn refresh(&self) -> Result<JobOutcome> {
        info!("On-demand refresh requested");
        self.run_heavy().await
    }
}

pub struct JobScheduler {
    jobs: Arc<Jobs>,
    next_scan: DateTime<Utc>,
    next_optimize: DateTime<Utc>,
    scan_every: chrono::Duration,
    optimize_every: chrono::Duration,
    tick_interval: std::time::Duration,
    clock: Arc<dyn Clock>,
}

impl JobScheduler {
    pub fn new(jobs: Arc<Jobs>, config: &WardenConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            jobs,
            // Both jobs are due immediately on startup.
            next_scan: now,
            next_optimize: now,
            scan_every: chrono::Duration::seconds(config.scan_interval_secs as i64),
            optimize_every: chrono::Duration::seconds(config.optimize_interval_secs as i64),
            tick_interval: config.tick_interval(),
            clock,
        }
    }

    /// Handle for external refresh triggers.
    pub fn jobs(&self) -> Arc<Jobs> {
        Arc::clone(&self.jobs)
    }

    /// One tick: run whichever jobs are due. A job fires at the first
    /// tick at or after its due time, so apparent delay up to one tick
    /// width is expected. Failures and skips both wait for the next
    /// natural due time.
    pub async fn tick(&mut self) {
        let now = self.clock.now();

        if now >= self.next_scan {
            match self.jobs.run_light().await {
                Ok(JobOutcome::Completed) => debug!("Light job completed"),
                Ok(JobOutcome::Skipped) => info!("Light job skipped: run guard held"),
                Err(e) => error!("Light job failed: {:#}", e),
            }
            self.next_scan = now + self.scan_every;
        }

        if now >= self.next_optimize {
            match self.jobs.run_heavy().await {
                Ok(JobOutcome::Completed) => debug!("Heavy job completed"),
                Ok(JobOutcome::Skipped) => info!("Heavy job skipped: run guard held"),
                Err(e) => error!("Heavy job failed: {:#}", e),
            }
            self.next_optimize = now + self.optimize_every;
        }
    }

    /// Tick loop. Exits after the current iteration once `shutdown` is
    /// set; an in-flight job is never interrupted.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>) {
        info!(
            "Job scheduler running (light every {}s, heavy every {}s, tick {}s)",
            self.scan_every.num_seconds(),
            self.optimize_every.num_seconds(),
            self.tick_interval.as_secs()
        );
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !shutdown.load(Ordering::Relaxed) {
            ticker.tick().await;
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            self.tick().await;
        }

        info!("Job scheduler stopped");
    }
}
