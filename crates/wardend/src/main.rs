//! Warden Daemon - local network health monitor.
//!
//! Runs two independent loops against one append-only event log: the
//! outage monitor polling connectivity, and the job scheduler capturing
//! scans, scoring them, and rebuilding the derived series.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wardend::config::WardenConfig;
use wardend::monitor::{OutageMonitor, SystemClock};
use wardend::probe::TcpProbe;
use wardend::report::DisabledGenerator;
use wardend::scheduler::{JobScheduler, Jobs};
use wardend::store::EventStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("wardend v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(WardenConfig::load_from_env());
    let store = Arc::new(EventStore::new(config.history_path())?);
    let clock = Arc::new(SystemClock);
    let probe = Arc::new(TcpProbe::from_config(&config));
    let generator = Arc::new(DisabledGenerator);

    let monitor = OutageMonitor::new(&config, Arc::clone(&store), clock.clone());
    let jobs = Arc::new(Jobs::new(
        Arc::clone(&config),
        Arc::clone(&store),
        probe.clone(),
        generator,
        clock.clone(),
    ));
    let scheduler = JobScheduler::new(jobs, &config, clock);

    // One cooperative shutdown flag for both loops; each exits after
    // finishing its current iteration.
    let shutdown = Arc::new(AtomicBool::new(false));

    let monitor_task = tokio::spawn(monitor.run(probe, Arc::clone(&shutdown)));
    let scheduler_task = tokio::spawn(scheduler.run(Arc::clone(&shutdown)));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown.store(true, Ordering::Relaxed);

    let _ = tokio::join!(monitor_task, scheduler_task);
    info!("wardend stopped");

    Ok(())
}
