//! Per-invocation generation times recorded in a transcript.

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::config::Markers;
use crate::error::Result;

/// How long one model invocation took
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRecord {
    #[serde(rename = "Model")]
    pub model: String,
    /// Absolute seconds, rounded to 2 decimals
    #[serde(rename = "Time")]
    pub seconds: f64,
}

#[derive(Debug, Clone)]
pub struct TimingExtractor {
    pattern: Regex,
}

impl TimingExtractor {
    pub fn new(markers: &Markers) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"(?s){}\s+(.+?)\s+{}.*?{}\s*([-\d.]+)\s*{}",
            regex::escape(&markers.query_prefix),
            regex::escape(&markers.query_suffix),
            regex::escape(&markers.time_marker),
            regex::escape(&markers.time_unit)
        ))?;
        Ok(Self { pattern })
    }

    /// One record per header that is followed by a parseable time.
    ///
    /// Some runs logged negative elapsed times, so the magnitude is kept.
    pub fn extract(&self, text: &str) -> Vec<TimingRecord> {
        let mut records = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            let model = caps[1].trim().to_string();
            let raw = &caps[2];
            match raw.parse::<f64>() {
                Ok(value) => records.push(TimingRecord {
                    model,
                    seconds: round2(value.abs()),
                }),
                Err(e) => warn!("Skipping unparseable time {:?} for {}: {}", raw, model, e),
            }
        }
        records
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
