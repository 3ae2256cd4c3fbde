pub mod sanitize;
pub mod segment;

pub use sanitize::Sanitizer;
pub use segment::{SegmentStrategy, Segmenter, TranscriptBlock};
