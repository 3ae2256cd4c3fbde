//! Longest-matching-block sequence similarity.
//!
//! Matches `difflib.SequenceMatcher(None, a, b).ratio()` so scores are
//! comparable with earlier experiment runs, including the auto-junk rule that
//! ignores very frequent characters of `b` when `b` has 200 or more elements.

use std::collections::HashMap;

/// `b` must be at least this long before popular elements are ignored
const AUTOJUNK_MIN_LEN: usize = 200;

/// A run of `size` equal elements at `a[a_start..]` and `b[b_start..]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Similarity ratio of two strings, in [0, 1]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    SequenceMatcher::new(&a, &b).ratio()
}

/// Compares two sequences by recursively finding their longest common block
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions of each element of `b`, minus popular elements
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + std::hash::Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    pub fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> MatchingBlock {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0);

        // j2len[j] = length of the longest match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular elements were left out of b2j; let equal neighbours extend the block.
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        MatchingBlock {
            a_start: besti,
            b_start: bestj,
            size: bestsize,
        }
    }

    /// Non-overlapping matching blocks, ordered by position
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
                queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
            }
            blocks.push(m);
        }

        blocks.sort_by_key(|m| (m.a_start, m.b_start));
        blocks
    }

    /// `2·M / T`; two empty sequences are identical
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(ratio("patient has flu", "patient has flu"), 1.0);
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
        assert_eq!(ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_known_difflib_values() {
        // difflib.SequenceMatcher(None, a, b).ratio()
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        assert!(approx(ratio("patient has flu", "patient has cold"), 26.0 / 31.0));
        assert!(approx(ratio("qabxcd", "abycdf"), 2.0 * 4.0 / 12.0));
    }

    #[test]
    fn test_find_longest_match_prefers_earliest() {
        let a: Vec<char> = " abcd".chars().collect();
        let b: Vec<char> = "abcd abcd".chars().collect();
        let m = SequenceMatcher::new(&a, &b).find_longest_match(0, 5, 0, 9);
        assert_eq!(
            m,
            MatchingBlock {
                a_start: 0,
                b_start: 4,
                size: 5
            }
        );
    }

    #[test]
    fn test_matching_blocks_sorted() {
        let a: Vec<char> = "abxcd".chars().collect();
        let b: Vec<char> = "abcd".chars().collect();
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!((blocks[0].a_start, blocks[0].b_start, blocks[0].size), (0, 0, 2));
        assert_eq!((blocks[1].a_start, blocks[1].b_start, blocks[1].size), (3, 2, 2));
    }

    #[test]
    fn test_autojunk_ignores_popular_characters() {
        // In a 200+ element b, 'a' is popular and cannot seed a match.
        let b = "a".repeat(250);
        assert_eq!(ratio("baaa", &b), 0.0);
        // Short b is not affected.
        assert!(approx(ratio("baaa", &"a".repeat(10)), 6.0 / 14.0));
    }

    #[test]
    fn test_popular_characters_extend_seeded_blocks() {
        // 'x' seeds the match and the popular spaces around it extend it.
        let mut b = " ".repeat(300);
        b.push('x');
        b.push_str(&" ".repeat(10));
        let a = "  x  ";
        let expected = 2.0 * 5.0 / (5.0 + b.chars().count() as f64);
        assert!(approx(ratio(a, &b), expected));
    }

    #[test]
    fn test_unicode_counts_chars_not_bytes() {
        assert_eq!(ratio("résumé", "résumé"), 1.0);
        assert!(approx(ratio("é", "e"), 0.0));
    }

    proptest! {
        #[test]
        fn prop_ratio_is_bounded(a in ".{0,60}", b in ".{0,60}") {
            let r = ratio(&a, &b);
            prop_assert!((0.0..=1.0).contains(&r));
        }

        #[test]
        fn prop_self_ratio_is_one(a in ".{1,300}") {
            prop_assert_eq!(ratio(&a, &a), 1.0);
        }
    }
}
