//! Report generator seam.
//!
//! The heavy job hands the scoring/trend payload to an external narrative
//! generator and stores whatever JSON comes back as an opaque payload.
//! Generator failure never loses scoring data; the snapshot event is
//! written with the locally computed report either way.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use warden_common::{ScanSnapshot, ScoreReport, TrendDelta};

/// Everything the external generator gets to work with.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest<'a> {
    pub score_report: &'a ScoreReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<&'a TrendDelta>,
    pub scan: &'a ScanSnapshot,
}

pub trait ReportGenerator: Send + Sync {
    /// Produce a narrative report for the given payload. The returned
    /// text is expected to be JSON, possibly wrapped in markdown fences;
    /// the caller cleans and parses it.
    fn generate(&self, request: &ReportRequest<'_>) -> Result<String>;
}

/// Placeholder used when no generator service is wired in. The heavy job
/// treats the error as an ordinary generator failure and keeps going.
pub struct DisabledGenerator;

impl ReportGenerator for DisabledGenerator {
    fn generate(&self, _request: &ReportRequest<'_>) -> Result<String> {
        anyhow::bail!("report generation not configured")
    }
}

/// Parse generator output into JSON, tolerating markdown code fences
/// around the object. Anything without a parseable JSON body is an error.
pub fn clean_json_output(raw: &str) -> Result<Value> {
    let raw = raw.trim();

    let body = if raw.starts_with("```") {
        let first = raw.find('{');
        let last = raw.rfind('}');
        match (first, last) {
            (Some(first), Some(last)) if first < last => &raw[first..=last],
            _ => raw,
        }
    } else {
        raw
    };

    serde_json::from_str(body).context("report generator returned invalid JSON")
}
