//! Lenient structural scanner for the expected JSON object.
//!
//! Model output routinely breaks strict JSON (trailing commas, unescaped
//! quotes, bare words), so this matches the *shape* of the object instead of
//! parsing it: `{` then each required key in order with a loosely-typed value,
//! separated by commas, an optional trailing comma, then `}`.

/// Outcome of checking one sanitized block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

/// Byte span of one structural match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMatch {
    pub start: usize,
    pub end: usize,
}

/// Result of validating one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidation {
    pub json_count: usize,
    /// Block text with every match removed, trimmed
    pub residual: String,
    pub status: ComplianceStatus,
}

impl SchemaValidation {
    pub fn is_compliant(&self) -> bool {
        self.status == ComplianceStatus::Compliant
    }
}

/// Matches objects containing `fields` in order
#[derive(Debug, Clone)]
pub struct SchemaScanner {
    /// Quoted keys, e.g. `"diagnoses"`
    keys: Vec<String>,
}

impl SchemaScanner {
    pub fn new<S: AsRef<str>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: fields
                .into_iter()
                .map(|f| format!("\"{}\"", f.as_ref()))
                .collect(),
        }
    }

    /// All non-overlapping matches, left to right
    pub fn find_all(&self, text: &str) -> Vec<ObjectMatch> {
        let bytes = text.as_bytes();
        let mut matches = Vec::new();
        if self.keys.is_empty() {
            return matches;
        }

        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'{' {
                if let Some(end) = self.match_object(bytes, i) {
                    matches.push(ObjectMatch { start: i, end });
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
        matches
    }

    /// Count matches and classify the block
    pub fn validate(&self, text: &str) -> SchemaValidation {
        let matches = self.find_all(text);

        let mut residual = String::with_capacity(text.len());
        let mut last = 0;
        for m in &matches {
            residual.push_str(&text[last..m.start]);
            last = m.end;
        }
        residual.push_str(&text[last..]);
        let residual = residual.trim().to_string();

        let status = if matches.len() == 1 && residual.is_empty() {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        };

        SchemaValidation {
            json_count: matches.len(),
            residual,
            status,
        }
    }

    fn match_object(&self, b: &[u8], open: usize) -> Option<usize> {
        let pos = skip_ws(b, open + 1);
        self.match_field(b, pos, 0)
    }

    fn match_field(&self, b: &[u8], pos: usize, idx: usize) -> Option<usize> {
        let key = self.keys[idx].as_bytes();
        if !b[pos..].starts_with(key) {
            return None;
        }
        let pos = skip_ws(b, pos + key.len());
        if b.get(pos) != Some(&b':') {
            return None;
        }
        let value_start = pos + 1;
        let last = idx + 1 == self.keys.len();

        let mut ends = value_ends(b, skip_ws(b, value_start));
        ends.extend(bare_value_ends(b, value_start, last));
        ends.into_iter()
            .find_map(|end| self.match_after_value(b, end, idx))
    }

    fn match_after_value(&self, b: &[u8], pos: usize, idx: usize) -> Option<usize> {
        let mut pos = skip_ws(b, pos);
        if idx + 1 < self.keys.len() {
            if b.get(pos) != Some(&b',') {
                return None;
            }
            let pos = skip_ws(b, pos + 1);
            return self.match_field(b, pos, idx + 1);
        }

        if b.get(pos) == Some(&b',') {
            pos = skip_ws(b, pos + 1);
        }
        (b.get(pos) == Some(&b'}')).then_some(pos + 1)
    }
}

/// Candidate end offsets for a quoted or bracketed value starting at `pos`.
///
/// A quoted value yields every later unescaped quote as a candidate so an
/// unescaped quote inside the string does not end the match early.
fn value_ends(b: &[u8], pos: usize) -> Vec<usize> {
    let mut ends = Vec::new();
    match b.get(pos) {
        Some(b'"') => {
            let mut i = pos + 1;
            let mut escaped = false;
            while i < b.len() {
                match b[i] {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => ends.push(i + 1),
                    _ => {}
                }
                i += 1;
            }
        }
        Some(b'[') | Some(b'{') => {
            if let Some(end) = matching_bracket(b, pos) {
                ends.push(end);
            }
        }
        _ => {}
    }
    ends
}

/// End (exclusive) of the bracketed value opened at `open`, tracking depth
/// across both bracket kinds and ignoring brackets inside strings.
fn matching_bracket(b: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in b.iter().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'[' | b'{' if !in_string => depth += 1,
            b']' | b'}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Ends for a bare value: one or more non-comma bytes starting right after
/// the colon, so whitespace alone counts and `}` may be crossed.
///
/// Only ends the rest of the object can follow are returned, longest first.
/// A field with more fields after it must stop at the comma. The last field
/// may stop at the comma or at any `}` before it.
fn bare_value_ends(b: &[u8], start: usize, last: bool) -> Vec<usize> {
    let stop = b[start..]
        .iter()
        .position(|&ch| ch == b',')
        .map_or(b.len(), |n| start + n);
    if stop == start {
        return Vec::new();
    }

    let mut ends = Vec::new();
    if stop < b.len() {
        ends.push(stop);
    }
    if last {
        ends.extend((start + 1..stop).rev().filter(|&i| b[i] == b'}'));
    }
    ends
}

fn skip_ws(b: &[u8], mut pos: usize) -> usize {
    while pos < b.len() && b[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}
