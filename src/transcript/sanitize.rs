use regex::Regex;

use crate::config::Markers;
use crate::error::Result;

/// Removes reasoning traces (`<think>...</think>`) from block text
#[derive(Debug, Clone)]
pub struct Sanitizer {
    reasoning: Regex,
}

impl Sanitizer {
    pub fn new(markers: &Markers) -> Result<Self> {
        let reasoning = Regex::new(&format!(
            r"(?s){}.*?{}",
            regex::escape(&markers.reasoning_open),
            regex::escape(&markers.reasoning_close)
        ))?;
        Ok(Self { reasoning })
    }

    /// Remove every matched reasoning span, then trim.
    ///
    /// An open marker without a close is left in place so it shows up as
    /// residual content in the compliance report.
    pub fn sanitize(&self, text: &str) -> String {
        self.reasoning.replace_all(text, "").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(text: &str) -> String {
        Sanitizer::new(&Markers::default()).unwrap().sanitize(text)
    }

    #[test]
    fn test_strip_single_span() {
        let text = r#"<think>ignore this</think>{"original_document": "x"}"#;
        assert_eq!(sanitize(text), r#"{"original_document": "x"}"#);
    }

    #[test]
    fn test_strip_multiple_multiline_spans() {
        let text = "<think>one\ntwo</think>  {\"a\": 1}\n<think>\nthree\n</think>\n";
        assert_eq!(sanitize(text), "{\"a\": 1}");
    }

    #[test]
    fn test_non_greedy_keeps_text_between_spans() {
        let text = "<think>a</think>keep<think>b</think>";
        assert_eq!(sanitize(text), "keep");
    }

    #[test]
    fn test_unclosed_tag_is_left_alone() {
        let text = "<think>never closed {\"a\": 1}";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_text_without_reasoning_only_trimmed() {
        assert_eq!(sanitize("  {\"a\": \"<b>\"}\n"), "{\"a\": \"<b>\"}");
    }

    #[test]
    fn test_custom_reasoning_markers() {
        let markers = Markers {
            reasoning_open: "<unused94>".to_string(),
            reasoning_close: "<unused95>".to_string(),
            ..Markers::default()
        };
        let sanitizer = Sanitizer::new(&markers).unwrap();
        assert_eq!(sanitizer.sanitize("<unused94>plan<unused95>{}"), "{}");
    }
}
