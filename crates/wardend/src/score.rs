//! Scoring engine: raw scan in, congestion summary and health score out.
//!
//! Pure and deterministic; identical snapshots always produce identical
//! reports, which is what makes trend comparison and replayed history
//! meaningful.

use once_cell::sync::Lazy;
use regex::Regex;

use warden_common::{BandCounts, FiveGhzBlocks, NetworkObservation, ScanSnapshot, ScoreReport};

/// Leading integer of a free-text channel descriptor like "11 (2GHz, 20MHz)".
static CHANNEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)").expect("valid regex"));

/// Frequency band derived from a channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Ghz24,
    Ghz5,
}

/// Extract the numeric channel from a descriptor. Descriptors without a
/// leading integer are unclassifiable.
pub fn parse_channel(descriptor: &str) -> Option<u16> {
    CHANNEL_RE
        .captures(descriptor)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
}

/// Channels 1-14 are 2.4 GHz; everything above is treated as 5 GHz.
pub fn band_for_channel(channel: u16) -> Band {
    if (1..=14).contains(&channel) {
        Band::Ghz24
    } else {
        Band::Ghz5
    }
}

fn bucket_5ghz(blocks: &mut FiveGhzBlocks, channel: u16, count: usize) {
    match channel {
        36..=48 => blocks.low += count,
        52..=64 => blocks.dfs_low += count,
        100..=144 => blocks.dfs_high += count,
        149..=161 => blocks.high += count,
        165 => blocks.isolated += count,
        // Counted in the channel map, bucketed nowhere.
        _ => {}
    }
}

fn classify(networks: &[NetworkObservation]) -> ScoreReport {
    let mut report = ScoreReport {
        total_networks: networks.len(),
        band_counts: BandCounts::default(),
        channel_counts_24: Default::default(),
        channel_counts_5: Default::default(),
        block_counts_5: FiveGhzBlocks::default(),
        health_score: 100,
        speedtest: None,
    };

    for net in networks {
        let Some(channel) = parse_channel(&net.channel) else {
            // Unparsable descriptor: stays in total_networks, joins no band.
            continue;
        };
        match band_for_channel(channel) {
            Band::Ghz24 => {
                report.band_counts.ghz24 += 1;
                *report.channel_counts_24.entry(channel).or_insert(0) += 1;
            }
            Band::Ghz5 => {
                report.band_counts.ghz5 += 1;
                *report.channel_counts_5.entry(channel).or_insert(0) += 1;
            }
        }
    }

    let blocks: Vec<(u16, usize)> = report
        .channel_counts_5
        .iter()
        .map(|(&ch, &count)| (ch, count))
        .collect();
    for (channel, count) in blocks {
        bucket_5ghz(&mut report.block_counts_5, channel, count);
    }

    report
}

/// Score one snapshot: start at 100, apply the ordered congestion and
/// speed penalties, clamp to [0, 100].
pub fn analyze(scan: &ScanSnapshot) -> ScoreReport {
    let mut report = classify(&scan.networks);
    report.speedtest = scan.speedtest.clone();
    let bands = report.band_counts;

    let mut score: i32 = 100;

    // Congestion penalties, one per band, non-cumulative within a band.
    score -= match bands.ghz24 {
        n if n >= 6 => 20,
        n if n >= 3 => 10,
        _ => 0,
    };
    score -= match bands.ghz5 {
        n if n >= 8 => 15,
        n if n >= 4 => 8,
        _ => 0,
    };

    // Speed penalties. Missing speed fields coerce to zero and penalize
    // as slow.
    let (down, up, ping) = scan.speed_fields();
    if down < 50.0 {
        score -= 15;
    }
    if up < 10.0 {
        score -= 10;
    }
    if ping > 50.0 {
        score -= 10;
    }

    report.health_score = score.clamp(0, 100) as u8;
    report
}
