//! Scoring and trend output types.
//!
//! `ScoreReport` is the deterministic summary the scoring engine derives
//! from one scan; `TrendDelta` is the signed comparison between the two
//! most recent scans. Wire field names are kept stable because the series
//! builder and external consumers resolve them by name from raw JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scan::SpeedResult;

/// Channel-count maps travel with string keys on the wire, as JSON object
/// keys always are. Keeping the conversion explicit also survives the
/// buffering serde does for internally tagged records, which cannot turn
/// string keys back into integers on its own.
mod channel_keys {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<u16, usize>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let keyed: BTreeMap<String, usize> =
            map.iter().map(|(ch, count)| (ch.to_string(), *count)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<u16, usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let keyed = BTreeMap::<String, usize>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(ch, count)| {
                ch.parse::<u16>()
                    .map(|ch| (ch, count))
                    .map_err(|_| D::Error::custom(format!("invalid channel key: {}", ch)))
            })
            .collect()
    }
}

/// Networks per band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    #[serde(rename = "2.4", default)]
    pub ghz24: usize,
    #[serde(rename = "5", default)]
    pub ghz5: usize,
}

/// 5 GHz networks bucketed into the fixed regulatory channel blocks.
/// Channels outside every block are counted in the channel map but land
/// in no bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiveGhzBlocks {
    #[serde(rename = "36-48", default)]
    pub low: usize,
    #[serde(rename = "52-64(DFS)", default)]
    pub dfs_low: usize,
    #[serde(rename = "100-144(DFS)", default)]
    pub dfs_high: usize,
    #[serde(rename = "149-161", default)]
    pub high: usize,
    #[serde(rename = "165", default)]
    pub isolated: usize,
}

/// Congestion/band summary plus the bounded 0-100 health score for one
/// scan. Pure data; identical scans always produce identical reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total_networks: usize,
    pub band_counts: BandCounts,

    /// Per-channel network counts, keyed by extracted channel number.
    /// BTreeMap keeps serialization order deterministic.
    #[serde(with = "channel_keys", default)]
    pub channel_counts_24: BTreeMap<u16, usize>,
    #[serde(with = "channel_keys", default)]
    pub channel_counts_5: BTreeMap<u16, usize>,

    pub block_counts_5: FiveGhzBlocks,

    #[serde(rename = "wifi_health_score")]
    pub health_score: u8,

    /// Speed test carried over from the scan, untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speedtest: Option<SpeedResult>,
}

/// Signed change between the two most recent persisted scans.
///
/// Sign convention: positive download/upload deltas mean the current scan
/// is faster; a positive ping delta means latency got worse. The delta
/// engine returns `None` instead of a zeroed struct when fewer than two
/// snapshots exist, so "no change" and "no data" stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendDelta {
    pub download_delta_mbps: f64,
    pub upload_delta_mbps: f64,
    pub ping_delta_ms: f64,
    pub networks_delta: i64,
}
