use regex::Regex;
use tracing::debug;

use crate::config::Markers;
use crate::error::{EvalError, Result};

/// How a transcript is split into per-invocation blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStrategy {
    /// Text between the end of a reasoning trace (or "please wait...") and
    /// "Time to completion". No model name is available.
    CompletionMarker,
    /// Text between a "Starting query using model X please wait..." header
    /// and the next "Time:" marker, with X captured as the model name.
    ModelHeader,
}

impl SegmentStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentStrategy::CompletionMarker => "completion-marker",
            SegmentStrategy::ModelHeader => "model-header",
        }
    }
}

/// One recorded model invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptBlock {
    pub model: Option<String>,
    pub text: String,
    /// Byte offset of `text` in the transcript
    pub offset: usize,
    /// 1-based line of `offset`
    pub line: usize,
}

impl TranscriptBlock {
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or("unknown")
    }
}

/// Compiled block patterns for one set of markers
#[derive(Debug, Clone)]
pub struct Segmenter {
    completion: Regex,
    header: Regex,
}

impl Segmenter {
    pub fn new(markers: &Markers) -> Result<Self> {
        if markers.block_start.is_empty() {
            return Err(EvalError::Config(
                "at least one block start marker is required".to_string(),
            ));
        }

        let starts = markers
            .block_start
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        let completion = Regex::new(&format!(
            r"(?s)(?:{})\s*(.*?)\s*{}",
            starts,
            regex::escape(&markers.block_end)
        ))?;

        let header = Regex::new(&format!(
            r"(?s){}\s+(.*?)\s+{}(.*?){}",
            regex::escape(&markers.query_prefix),
            regex::escape(&markers.query_suffix),
            regex::escape(&markers.time_marker)
        ))?;

        Ok(Self { completion, header })
    }

    /// Split `text` into non-overlapping blocks in document order.
    ///
    /// Returns an empty vector when no marker pair is present.
    pub fn segment(&self, text: &str, strategy: SegmentStrategy) -> Vec<TranscriptBlock> {
        let mut blocks = Vec::new();

        match strategy {
            SegmentStrategy::CompletionMarker => {
                for caps in self.completion.captures_iter(text) {
                    if let Some(body) = caps.get(1) {
                        blocks.push(TranscriptBlock {
                            model: None,
                            text: body.as_str().to_string(),
                            offset: body.start(),
                            line: line_of(text, body.start()),
                        });
                    }
                }
            }
            SegmentStrategy::ModelHeader => {
                for caps in self.header.captures_iter(text) {
                    let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    blocks.push(TranscriptBlock {
                        model: Some(name.as_str().trim().to_string()),
                        text: body.as_str().to_string(),
                        offset: body.start(),
                        line: line_of(text, body.start()),
                    });
                }
            }
        }

        debug!("Segmented {} blocks ({})", blocks.len(), strategy.name());
        blocks
    }
}

/// 1-based line number of a byte offset
fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str, strategy: SegmentStrategy) -> Vec<TranscriptBlock> {
        Segmenter::new(&Markers::default()).unwrap().segment(text, strategy)
    }

    #[test]
    fn test_no_markers_gives_no_blocks() {
        let text = "just some log output\nwith nothing interesting";
        assert!(segment(text, SegmentStrategy::CompletionMarker).is_empty());
        assert!(segment(text, SegmentStrategy::ModelHeader).is_empty());
    }

    #[test]
    fn test_completion_marker_blocks_are_minimal() {
        let text = "please wait...\n{\"a\": 1}\nTime to completion: 3s\n\
                    please wait...\n{\"b\": 2}\nTime to completion: 4s\n";
        let blocks = segment(text, SegmentStrategy::CompletionMarker);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "{\"a\": 1}");
        assert_eq!(blocks[1].text, "{\"b\": 2}");
        assert_eq!(blocks[0].line, 2);
        assert_eq!(blocks[1].line, 5);
        assert!(blocks.iter().all(|b| b.model.is_none()));
    }

    #[test]
    fn test_completion_marker_after_reasoning() {
        let text = "please wait...<think>hmm\nlet me see</think>\n  {\"x\": 1}  Time to completion";
        let blocks = segment(text, SegmentStrategy::CompletionMarker);
        // The first start marker wins and the block runs to the end marker.
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "<think>hmm\nlet me see</think>\n  {\"x\": 1}");
    }

    #[test]
    fn test_offset_points_at_block_text() {
        let text = "noise please wait...   body Time to completion";
        let blocks = segment(text, SegmentStrategy::CompletionMarker);
        assert_eq!(&text[blocks[0].offset..blocks[0].offset + 4], "body");
    }

    #[test]
    fn test_model_header_captures_names() {
        let text = "Starting query using model llama3:8b please wait...\n{}\nTime: 12.5 seconds\n\
                    Starting query using model  qwen3  please wait...\nnothing\nTime: -3 seconds\n";
        let blocks = segment(text, SegmentStrategy::ModelHeader);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].model.as_deref(), Some("llama3:8b"));
        assert_eq!(blocks[0].text, "\n{}\n");
        assert_eq!(blocks[1].model_name(), "qwen3");
        assert_eq!(blocks[1].line, 4);
    }

    #[test]
    fn test_model_header_without_time_marker_is_dropped() {
        let text = "Starting query using model m please wait... output never finished";
        assert!(segment(text, SegmentStrategy::ModelHeader).is_empty());
    }

    #[test]
    fn test_custom_markers() {
        let markers = Markers {
            block_start: vec!["[BEGIN]".to_string()],
            block_end: "[END]".to_string(),
            ..Markers::default()
        };
        let segmenter = Segmenter::new(&markers).unwrap();
        let blocks = segmenter.segment("[BEGIN] a [END] [BEGIN] b [END]", SegmentStrategy::CompletionMarker);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_start_markers_rejected() {
        let markers = Markers {
            block_start: Vec::new(),
            ..Markers::default()
        };
        assert!(matches!(Segmenter::new(&markers), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_line_of() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 2), 2);
        assert_eq!(line_of("a\nb\nc", 4), 3);
    }
}
