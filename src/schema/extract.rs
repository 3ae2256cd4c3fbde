use regex::Regex;

use crate::error::Result;

/// Pulls the raw string value of one key out of loosely-formed JSON.
///
/// Runs independently of [`super::SchemaScanner`], so a block that fails the
/// structural check can still yield a document.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    key: Regex,
}

impl FieldExtractor {
    pub fn new(field: &str) -> Result<Self> {
        let key = Regex::new(&format!(r#""{}":\s""#, regex::escape(field)))?;
        Ok(Self { key })
    }

    /// Every value in encounter order.
    ///
    /// A value runs from the opening quote to the first unescaped `",`, which
    /// may be several lines later. Escapes are kept as written.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut values = Vec::new();
        let mut from = 0;

        while let Some(key) = self.key.find_at(text, from) {
            match value_end(text, key.end()) {
                Some(end) => {
                    values.push(text[key.end()..end].to_string());
                    // skip the closing `",`
                    from = end + 2;
                }
                None => break,
            }
        }
        values
    }
}

/// Offset of the first `",` after `start` whose quote is not escaped
fn value_end(text: &str, start: usize) -> Option<usize> {
    let b = text.as_bytes();
    let mut escaped = false;
    for (i, &ch) in b.iter().enumerate().skip(start) {
        match ch {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' if b.get(i + 1) == Some(&b',') => return Some(i),
            _ => {}
        }
    }
    None
}
