//! Configuration management for wardend.
//!
//! Loads settings from a TOML file or falls back to defaults. All tunables
//! live in one immutable `WardenConfig` handed to each component at
//! construction; nothing reads module-level globals at runtime.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "WARDEND_CONFIG";

/// Default config file path.
pub const CONFIG_PATH: &str = "/etc/wifi-warden/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Connectivity poll frequency in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Continuous failure required before an outage is confirmed.
    #[serde(default = "default_outage_start")]
    pub outage_start_secs: u64,

    /// Outages shorter than this are discarded as blips, never reported.
    #[serde(default = "default_outage_min_duration")]
    pub outage_min_duration_secs: u64,

    /// Light (scan-only) job interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Heavy (speed test + scoring + report) job interval in seconds.
    #[serde(default = "default_optimize_interval")]
    pub optimize_interval_secs: u64,

    /// Scheduler tick resolution. Jobs fire at the first tick at or after
    /// their due time, so apparent delay up to one tick width is expected.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Connectivity targets, tried in order; the first success wins.
    #[serde(default = "default_ping_targets")]
    pub ping_targets: Vec<String>,

    /// Per-target connectivity timeout in milliseconds.
    #[serde(default = "default_ping_timeout")]
    pub max_ping_timeout_ms: u64,

    /// Directory holding the event log and derived output files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_history_file")]
    pub history_file: String,

    #[serde(default = "default_series_file")]
    pub series_file: String,

    #[serde(default = "default_daily_file")]
    pub daily_file: String,

    #[serde(default = "default_latest_report_file")]
    pub latest_report_file: String,
}

fn default_ping_interval() -> u64 {
    5
}

fn default_outage_start() -> u64 {
    15
}

fn default_outage_min_duration() -> u64 {
    10
}

fn default_scan_interval() -> u64 {
    300 // 5 minutes
}

fn default_optimize_interval() -> u64 {
    21_600 // 6 hours
}

fn default_tick_interval() -> u64 {
    2
}

fn default_ping_targets() -> Vec<String> {
    vec!["1.1.1.1:53".to_string(), "8.8.8.8:53".to_string()]
}

fn default_ping_timeout() -> u64 {
    1500
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/wifi-warden")
}

fn default_history_file() -> String {
    "agent_history.jsonl".to_string()
}

fn default_series_file() -> String {
    "history_series.json".to_string()
}

fn default_daily_file() -> String {
    "history_daily.json".to_string()
}

fn default_latest_report_file() -> String {
    "latest_report.json".to_string()
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            outage_start_secs: default_outage_start(),
            outage_min_duration_secs: default_outage_min_duration(),
            scan_interval_secs: default_scan_interval(),
            optimize_interval_secs: default_optimize_interval(),
            tick_interval_secs: default_tick_interval(),
            ping_targets: default_ping_targets(),
            max_ping_timeout_ms: default_ping_timeout(),
            data_dir: default_data_dir(),
            history_file: default_history_file(),
            series_file: default_series_file(),
            daily_file: default_daily_file(),
            latest_report_file: default_latest_report_file(),
        }
    }
}

impl WardenConfig {
    /// Load config from `path`, falling back to defaults on any error.
    /// A malformed config file degrades, it never stops the daemon.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<WardenConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve the config path from the environment, then load.
    pub fn load_from_env() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.max_ping_timeout_ms)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }

    pub fn series_path(&self) -> PathBuf {
        self.data_dir.join(&self.series_file)
    }

    pub fn daily_path(&self) -> PathBuf {
        self.data_dir.join(&self.daily_file)
    }

    pub fn latest_report_path(&self) -> PathBuf {
        self.data_dir.join(&self.latest_report_file)
    }
}
