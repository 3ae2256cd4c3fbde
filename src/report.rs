//! Report rows and their console/CSV renderings.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::schema::ComplianceStatus;
use crate::scoring::BestMatch;
use crate::timing::TimingRecord;

/// Key of the row emitted for a block with no extractable document
pub const FAILED_JSON_KEY: &str = "Model Failed JSON gen";

/// One extracted document scored against the references
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "MatchedKey")]
    pub matched_key: String,
    #[serde(rename = "Similarity")]
    pub similarity: f64,
    #[serde(rename = "ErrorRate")]
    pub error_rate: f64,
}

impl ScoreRecord {
    pub fn scored(model: impl Into<String>, best: BestMatch) -> Self {
        let error_rate = best.error_rate();
        Self {
            model: model.into(),
            matched_key: best.key,
            similarity: best.similarity,
            error_rate,
        }
    }

    /// Sentinel row for a block that produced no document.
    ///
    /// Error rate is 0. Summaries count these rows as failures and leave them
    /// out of the means.
    pub fn failed_generation(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            matched_key: FAILED_JSON_KEY.to_string(),
            similarity: 0.0,
            error_rate: 0.0,
        }
    }

    pub fn is_failed_generation(&self) -> bool {
        self.matched_key == FAILED_JSON_KEY
    }
}

/// Scored rows in encounter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    pub records: Vec<ScoreRecord>,
}

impl ScoreReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-model aggregates, models in first-seen order
    pub fn summaries(&self) -> Vec<ModelSummary> {
        let mut summaries: Vec<ModelSummary> = Vec::new();
        for record in &self.records {
            let idx = match summaries.iter().position(|s| s.model == record.model) {
                Some(idx) => idx,
                None => {
                    summaries.push(ModelSummary::new(&record.model));
                    summaries.len() - 1
                }
            };
            summaries[idx].add(record);
        }
        summaries
    }

    /// Fixed-width table, one line per record
    pub fn write_table<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        if self.records.is_empty() {
            writeln!(out, "No model blocks found in transcript.")?;
            return Ok(());
        }
        writeln!(out, "Model           | Matched Key           | Similarity | Error Rate")?;
        writeln!(out, "{}", "-".repeat(50))?;
        for r in &self.records {
            writeln!(
                out,
                "{:15} | {:21} | {:.3}      | {:.3}",
                r.model, r.matched_key, r.similarity, r.error_rate
            )?;
        }
        Ok(())
    }

    pub fn write_summary<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Model           | Rows | Failed | Mean Similarity | Mean Error Rate")?;
        writeln!(out, "{}", "-".repeat(68))?;
        for s in self.summaries() {
            let (sim, err) = match (s.mean_similarity(), s.mean_error_rate()) {
                (Some(sim), Some(err)) => (format!("{:.3}", sim), format!("{:.3}", err)),
                _ => ("-".to_string(), "-".to_string()),
            };
            writeln!(
                out,
                "{:15} | {:4} | {:6} | {:15} | {}",
                s.model, s.rows, s.failed, sim, err
            )?;
        }
        Ok(())
    }

    /// CSV with columns Model, MatchedKey, Similarity, ErrorRate
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_rows(path, &self.records)?;
        info!("Wrote {} score rows to {}", self.records.len(), path.display());
        Ok(())
    }
}

/// Aggregate of one model's rows
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub model: String,
    pub rows: usize,
    pub failed: usize,
    similarity_sum: f64,
    error_rate_sum: f64,
}

impl ModelSummary {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            rows: 0,
            failed: 0,
            similarity_sum: 0.0,
            error_rate_sum: 0.0,
        }
    }

    fn add(&mut self, record: &ScoreRecord) {
        self.rows += 1;
        if record.is_failed_generation() {
            self.failed += 1;
        } else {
            self.similarity_sum += record.similarity;
            self.error_rate_sum += record.error_rate;
        }
    }

    fn scored(&self) -> usize {
        self.rows - self.failed
    }

    /// Mean over scored rows; `None` when every row failed
    pub fn mean_similarity(&self) -> Option<f64> {
        (self.scored() > 0).then(|| self.similarity_sum / self.scored() as f64)
    }

    pub fn mean_error_rate(&self) -> Option<f64> {
        (self.scored() > 0).then(|| self.error_rate_sum / self.scored() as f64)
    }
}

/// Console table for timing rows
pub fn write_timing_table<W: Write + ?Sized>(records: &[TimingRecord], out: &mut W) -> Result<()> {
    writeln!(out, "{:<12} | Time", "Model")?;
    writeln!(out, "{}", "-".repeat(20))?;
    for r in records {
        writeln!(out, "{:<18} | {:.2}", r.model, r.seconds)?;
    }
    Ok(())
}

/// CSV with columns Model, Time
pub fn write_timing_csv(records: &[TimingRecord], path: &Path) -> Result<()> {
    write_rows(path, records)?;
    info!("Wrote {} timing rows to {}", records.len(), path.display());
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Compliance classification of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCompliance {
    /// 1-based position among the transcript's blocks
    pub index: usize,
    pub line: usize,
    pub model: Option<String>,
    pub json_count: usize,
    pub residual: String,
    pub status: ComplianceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceReport {
    pub blocks: Vec<BlockCompliance>,
}

impl ComplianceReport {
    pub fn compliant_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.status == ComplianceStatus::Compliant)
            .count()
    }

    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        if self.blocks.is_empty() {
            writeln!(out, "No blocks found between the specified markers.")?;
            return Ok(());
        }

        for b in &self.blocks {
            let model = b
                .model
                .as_deref()
                .map(|m| format!(" ({})", m))
                .unwrap_or_default();
            match b.status {
                ComplianceStatus::Compliant => {
                    writeln!(out, "Block {} at line {}{}: OK, only JSON found", b.index, b.line, model)?;
                }
                ComplianceStatus::NonCompliant => {
                    writeln!(
                        out,
                        "Block {} at line {}{}: FAIL, unexpected content or multiple JSONs",
                        b.index, b.line, model
                    )?;
                    if b.json_count != 1 {
                        writeln!(out, "  - JSON structures found: {}", b.json_count)?;
                    }
                    if !b.residual.is_empty() {
                        writeln!(out, "  - Other content found outside reasoning tags:\n{}\n", b.residual)?;
                    }
                }
            }
        }
        writeln!(
            out,
            "\n{} / {} blocks compliant",
            self.compliant_count(),
            self.blocks.len()
        )?;
        Ok(())
    }
}
