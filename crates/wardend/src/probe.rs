//! Probe adapter seam.
//!
//! The core never shells out to platform scan tools itself; it talks to a
//! `Probe` implementation. The contract is deliberately forgiving:
//! ordinary network failure is `false` or an empty network list, never an
//! error, and adapter-internal failures must be converted before they
//! reach the core. Calls may block up to a bounded timeout, so callers
//! run them on the blocking pool.

use anyhow::Result;
use chrono::Utc;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::WardenConfig;
use warden_common::ScanSnapshot;

pub trait Probe: Send + Sync {
    /// Single connectivity round trip against an ordered target list;
    /// succeeds on the first reachable target. Never errors: a tool
    /// failure degrades to `false`.
    fn probe_connectivity(&self) -> bool;

    /// Currently associated SSID, when the platform can tell.
    fn current_ssid(&self) -> Option<String>;

    /// Full scan, optionally with a speed test. Ordinary network failure
    /// is an empty network list; `Err` is reserved for adapter breakage
    /// and only aborts the one job that asked.
    fn scan(&self, with_speedtest: bool) -> Result<ScanSnapshot>;
}

/// Minimal built-in adapter: TCP reachability for connectivity, no
/// wireless backend. Platform scanners implement `Probe` externally and
/// are wired in at daemon construction; this keeps the outage monitor
/// useful on hosts where none is available.
pub struct TcpProbe {
    targets: Vec<String>,
    timeout: std::time::Duration,
}

impl TcpProbe {
    pub fn from_config(config: &WardenConfig) -> Self {
        Self {
            targets: config.ping_targets.clone(),
            timeout: config.ping_timeout(),
        }
    }
}

impl Probe for TcpProbe {
    fn probe_connectivity(&self) -> bool {
        for target in &self.targets {
            let addrs = match target.to_socket_addrs() {
                Ok(addrs) => addrs,
                Err(e) => {
                    debug!("Cannot resolve target {}: {}", target, e);
                    continue;
                }
            };
            for addr in addrs {
                if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                    return true;
                }
            }
        }
        false
    }

    fn current_ssid(&self) -> Option<String> {
        None
    }

    fn scan(&self, _with_speedtest: bool) -> Result<ScanSnapshot> {
        warn!("No wireless scan backend configured; returning empty snapshot");
        Ok(ScanSnapshot::empty(Utc::now(), std::env::consts::OS))
    }
}

/// Run a connectivity check off the async loops. A panicked or cancelled
/// blocking task degrades to `false`, same as any other probe failure.
pub async fn connectivity_check(probe: Arc<dyn Probe>) -> bool {
    tokio::task::spawn_blocking(move || probe.probe_connectivity())
        .await
        .unwrap_or(false)
}

/// Run the SSID lookup off the async loops.
pub async fn ssid_lookup(probe: Arc<dyn Probe>) -> Option<String> {
    tokio::task::spawn_blocking(move || probe.current_ssid())
        .await
        .unwrap_or(None)
}

/// Run a scan off the async loops.
pub async fn run_scan(probe: Arc<dyn Probe>, with_speedtest: bool) -> Result<ScanSnapshot> {
    tokio::task::spawn_blocking(move || probe.scan(with_speedtest))
        .await
        .map_err(|e| anyhow::anyhow!("scan task failed: {}", e))?
}
