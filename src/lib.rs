//! Scoring harness for LLM medical-record extraction transcripts.
//!
//! Splits recorded model output into per-invocation blocks, checks each block
//! for exactly one object of the expected schema, and scores the extracted
//! `original_document` text against ground-truth doctor notes.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod reference;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod tee;
pub mod timing;
pub mod transcript;


pub use config::{Config, Markers};
pub use error::{EvalError, Result};
pub use pipeline::Pipeline;
pub use reference::ReferenceSet;
pub use report::{ComplianceReport, ScoreRecord, ScoreReport};
pub use transcript::{SegmentStrategy, TranscriptBlock};
