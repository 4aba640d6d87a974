//! Raw scan snapshot types produced by the probe adapter.
//!
//! A `ScanSnapshot` is immutable once captured and is persisted verbatim
//! inside a snapshot event. Field shapes mirror what platform scanners
//! actually emit, so most of them are optional and the channel descriptor
//! stays free text until the scoring engine extracts a number from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed wireless network, as reported by the platform scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkObservation {
    #[serde(default)]
    pub ssid: Option<String>,

    /// Free-text channel descriptor, e.g. "11 (2GHz, 20MHz)" or "36".
    /// The numeric channel is extracted later, at classification time.
    #[serde(default)]
    pub channel: String,

    /// Received signal strength in dBm, when the scanner reports one.
    #[serde(default)]
    pub rssi_dbm: Option<i32>,

    #[serde(default)]
    pub security: Option<String>,
}

/// Speed test result attached to a heavy scan. Every field is optional;
/// consumers coerce absent values to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeedResult {
    #[serde(default)]
    pub download_mbps: Option<f64>,
    #[serde(default)]
    pub upload_mbps: Option<f64>,
    #[serde(default)]
    pub ping_ms: Option<f64>,
}

impl SpeedResult {
    pub fn download(&self) -> f64 {
        self.download_mbps.unwrap_or(0.0)
    }

    pub fn upload(&self) -> f64 {
        self.upload_mbps.unwrap_or(0.0)
    }

    pub fn ping(&self) -> f64 {
        self.ping_ms.unwrap_or(0.0)
    }
}

/// Output of one probe adapter scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub captured_at: DateTime<Utc>,

    /// Platform identifier of the scanner, e.g. "linux" or "macos".
    #[serde(default)]
    pub platform: String,

    /// Networks in the order the scanner reported them.
    #[serde(default)]
    pub networks: Vec<NetworkObservation>,

    /// Present only when the scan ran with a speed test enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speedtest: Option<SpeedResult>,
}

impl ScanSnapshot {
    /// An empty snapshot, used when the adapter had nothing to report.
    pub fn empty(captured_at: DateTime<Utc>, platform: impl Into<String>) -> Self {
        Self {
            captured_at,
            platform: platform.into(),
            networks: Vec::new(),
            speedtest: None,
        }
    }

    /// Coerced speed fields: `(download_mbps, upload_mbps, ping_ms)`,
    /// each 0.0 when the speed test is missing or the field is absent.
    pub fn speed_fields(&self) -> (f64, f64, f64) {
        match &self.speedtest {
            Some(sp) => (sp.download(), sp.upload(), sp.ping()),
            None => (0.0, 0.0, 0.0),
        }
    }
}
