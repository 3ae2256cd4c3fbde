use tracing::trace;

use super::similarity::ratio;
use crate::reference::ReferenceSet;

/// Key reported when no reference shares any text with the document
pub const NO_MATCH_KEY: &str = "No match";

/// Closest reference for one extracted document
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub key: String,
    pub similarity: f64,
}

impl BestMatch {
    pub fn error_rate(&self) -> f64 {
        1.0 - self.similarity
    }
}

/// Score `text` against every reference and keep the best.
///
/// References are visited in sorted key order and only a strictly higher
/// score replaces the current best, so the first key wins ties.
pub fn best_match(text: &str, references: &ReferenceSet) -> BestMatch {
    let mut best = BestMatch {
        key: NO_MATCH_KEY.to_string(),
        similarity: 0.0,
    };

    for (key, reference) in references.iter() {
        let score = ratio(text, reference);
        trace!("{} -> {:.3}", key, score);
        if score > best.similarity {
            best = BestMatch {
                key: key.to_string(),
                similarity: score,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes() -> ReferenceSet {
        [
            ("noteB.txt", "patient has cold"),
            ("noteA.txt", "patient has flu"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_exact_match_selected() {
        let best = best_match("patient has flu", &notes());
        assert_eq!(best.key, "noteA.txt");
        assert_eq!(best.similarity, 1.0);
        assert_eq!(best.error_rate(), 0.0);
    }

    #[test]
    fn test_tie_goes_to_first_sorted_key() {
        let refs: ReferenceSet = [("z.txt", "same"), ("a.txt", "same"), ("m.txt", "same")]
            .into_iter()
            .collect();
        assert_eq!(best_match("same", &refs).key, "a.txt");
    }

    #[test]
    fn test_no_overlap_reports_no_match() {
        let best = best_match("xyz", &notes());
        assert_eq!(best.key, NO_MATCH_KEY);
        assert_eq!(best.similarity, 0.0);
        assert_eq!(best.error_rate(), 1.0);
    }

    #[test]
    fn test_empty_reference_set() {
        let best = best_match("anything", &ReferenceSet::new());
        assert_eq!(best.key, NO_MATCH_KEY);
    }

    #[test]
    fn test_partial_text_prefers_closest() {
        let best = best_match("patient has a cold", &notes());
        assert_eq!(best.key, "noteB.txt");
        assert!(best.similarity > 0.5 && best.similarity < 1.0);
        assert!((best.error_rate() - (1.0 - best.similarity)).abs() < 1e-12);
    }
}
