//! Ratcliff–Obershelp sequence matching
//!
//! Finds the longest common contiguous block, then recurses on the pieces
//! to its left and right. No junk heuristics are applied: every element
//! takes part in matching.

use std::collections::HashMap;
use std::hash::Hash;

/// A matching block: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    /// Start in the first sequence
    pub a_start: usize,
    /// Start in the second sequence
    pub b_start: usize,
    /// Block length
    pub size: usize,
}

/// Sequence matcher over two slices
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    /// Create matcher, indexing positions of every element of `b`
    #[must_use]
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b2j.entry(item).or_default().push(j);
        }
        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`
    ///
    /// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
    #[must_use]
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let mut best = MatchingBlock {
            a_start: alo,
            b_start: blo,
            size: 0,
        };

        // j2len[j] = length of the match ending at a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
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
                    next.insert(j, k);
                    if k > best.size {
                        best = MatchingBlock {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next;
        }
        best
    }

    /// All matching blocks, ordered by position
    #[must_use]
    pub fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let found = self.find_longest_match(alo, ahi, blo, bhi);
            if found.size == 0 {
                continue;
            }
            let (i, j, k) = (found.a_start, found.b_start, found.size);
            blocks.push(found);
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));
        blocks
    }

    /// Total matched elements
    #[must_use]
    pub fn matched_len(&self) -> usize {
        self.matching_blocks().iter().map(|block| block.size).sum()
    }

    /// Similarity ratio `2M / (|a| + |b|)`
    ///
    /// Both empty gives 1.0, exactly one empty gives 0.0.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        if self.a.is_empty() || self.b.is_empty() {
            return 0.0;
        }
        2.0 * self.matched_len() as f64 / total as f64
    }
}

/// Ratcliff–Obershelp ratio of two sequences
#[must_use]
pub fn sequence_ratio<T: Eq + Hash>(a: &[T], b: &[T]) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn empty_cases() {
        let empty: [u8; 0] = [];
        assert_eq!(sequence_ratio(&empty, &empty), 1.0);
        assert_eq!(sequence_ratio(&empty, &[1u8]), 0.0);
        assert_eq!(sequence_ratio(&[1u8], &empty), 0.0);
    }

    #[test]
    fn identical_sequences() {
        let a = chars("abcdef");
        assert_eq!(sequence_ratio(&a, &a), 1.0);
    }

    #[test]
    fn known_ratio() {
        // Longest block "bcd" then nothing else matches
        let a = chars("abcd");
        let b = chars("bcde");
        assert_eq!(sequence_ratio(&a, &b), 0.75);
    }

    #[test]
    fn recursion_on_both_sides() {
        let a = chars("xaybzc");
        let b = chars("abc");
        let matcher = SequenceMatcher::new(&a, &b);
        let blocks = matcher.matching_blocks();
        assert_eq!(matcher.matched_len(), 3);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].a_start, 1);
    }

    #[test]
    fn ties_prefer_earliest_in_a() {
        let a = chars("abab");
        let b = chars("ab");
        let found = SequenceMatcher::new(&a, &b).find_longest_match(0, 4, 0, 2);
        assert_eq!(
            found,
            MatchingBlock {
                a_start: 0,
                b_start: 0,
                size: 2
            }
        );
    }

    #[test]
    fn works_on_strings() {
        let a: Vec<String> = ["Module", "Pass"].iter().map(|s| (*s).to_string()).collect();
        let b: Vec<String> = ["Module", "Break"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(sequence_ratio(&a, &b), 0.5);
    }

    proptest! {
        #[test]
        fn ratio_is_bounded(a in prop::collection::vec(0u8..4, 0..40), b in prop::collection::vec(0u8..4, 0..40)) {
            let r = sequence_ratio(&a, &b);
            prop_assert!((0.0..=1.0).contains(&r));
        }

        #[test]
        fn ratio_is_deterministic(a in prop::collection::vec(0u8..4, 0..40), b in prop::collection::vec(0u8..4, 0..40)) {
            prop_assert_eq!(sequence_ratio(&a, &b), sequence_ratio(&a, &b));
        }

        #[test]
        fn self_ratio_is_one(a in prop::collection::vec(0u8..8, 1..40)) {
            prop_assert_eq!(sequence_ratio(&a, &a), 1.0);
        }

        #[test]
        fn blocks_really_match(a in prop::collection::vec(0u8..3, 0..30), b in prop::collection::vec(0u8..3, 0..30)) {
            for block in SequenceMatcher::new(&a, &b).matching_blocks() {
                prop_assert_eq!(
                    &a[block.a_start..block.a_start + block.size],
                    &b[block.b_start..block.b_start + block.size]
                );
            }
        }
    }
}
