//! Transcript analysis runs: compliance, scoring and timing.
//!
//! Every stage is a pure transform over text already in memory. Per-block
//! failures become report rows, never errors.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::reference::ReferenceSet;
use crate::report::{BlockCompliance, ComplianceReport, ScoreRecord, ScoreReport};
use crate::schema::{FieldExtractor, SchemaScanner};
use crate::scoring::best_match;
use crate::timing::{TimingExtractor, TimingRecord};
use crate::transcript::{SegmentStrategy, Sanitizer, Segmenter};

/// All parsers compiled for one configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    segmenter: Segmenter,
    sanitizer: Sanitizer,
    scanner: SchemaScanner,
    extractor: FieldExtractor,
    timing: TimingExtractor,
    score_drafts: bool,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            segmenter: Segmenter::new(&config.markers)?,
            sanitizer: Sanitizer::new(&config.markers)?,
            scanner: SchemaScanner::new(&config.required_fields),
            extractor: FieldExtractor::new(&config.document_field)?,
            timing: TimingExtractor::new(&config.markers)?,
            score_drafts: config.score_reasoning_drafts,
        })
    }

    /// Classify every block found with `strategy`
    pub fn check_compliance(&self, text: &str, strategy: SegmentStrategy) -> ComplianceReport {
        let blocks = self.segmenter.segment(text, strategy);
        if blocks.is_empty() {
            warn!("No blocks found between the specified markers");
        }

        let blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                let cleaned = self.sanitizer.sanitize(&block.text);
                let validation = self.scanner.validate(&cleaned);
                debug!(
                    "Block {} at line {} (byte {}): {} JSON match(es), {:?}",
                    i + 1,
                    block.line,
                    block.offset,
                    validation.json_count,
                    validation.status
                );
                BlockCompliance {
                    index: i + 1,
                    line: block.line,
                    model: block.model,
                    json_count: validation.json_count,
                    residual: validation.residual,
                    status: validation.status,
                }
            })
            .collect::<Vec<_>>();

        let report = ComplianceReport { blocks };
        info!(
            "{} / {} blocks compliant",
            report.compliant_count(),
            report.blocks.len()
        );
        report
    }

    /// Score every extracted document against `references`.
    ///
    /// Blocks come from model headers so each row carries its model name.
    /// Documents are read from the raw block unless draft scoring is off, in
    /// which case reasoning spans are stripped first. A block with no
    /// document yields one failed-generation row.
    pub fn score_transcript(&self, text: &str, references: &ReferenceSet) -> ScoreReport {
        let blocks = self.segmenter.segment(text, SegmentStrategy::ModelHeader);
        if blocks.is_empty() {
            warn!("No model blocks found in transcript");
        }
        if references.is_empty() {
            warn!("Scoring against an empty reference set");
        }

        let mut records = Vec::new();
        for block in &blocks {
            let model = block.model_name();
            let documents = if self.score_drafts {
                self.extractor.extract(&block.text)
            } else {
                self.extractor.extract(&self.sanitizer.sanitize(&block.text))
            };

            if documents.is_empty() {
                debug!("{} at line {}: no document extracted", model, block.line);
                records.push(ScoreRecord::failed_generation(model));
                continue;
            }

            for document in documents {
                let best = best_match(&document, references);
                debug!("{}: {} ({:.3})", model, best.key, best.similarity);
                records.push(ScoreRecord::scored(model, best));
            }
        }

        info!(
            "Scored {} rows from {} blocks",
            records.len(),
            blocks.len()
        );
        ScoreReport { records }
    }

    pub fn extract_timings(&self, text: &str) -> Vec<TimingRecord> {
        let records = self.timing.extract(text);
        info!("Found {} timed invocations", records.len());
        records
    }
}
