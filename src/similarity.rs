//! Textual similarity between two messages.
//!
//! The ratio is computed by recursively locating the longest common block of
//! characters, then the longest blocks to its left and right, and so on.
//! With `M` matched characters over inputs of total length `T` the ratio is
//! `2M / T`, so identical strings score `1.0` and disjoint strings `0.0`.
//! Both inputs are lowercased first.

use std::collections::HashMap;

/// A run of equal characters: `a[a_start..a_start + len] == b[b_start..b_start + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// Returns the normalized similarity ratio of two strings in `[0, 1]`.
///
/// # Example
///
/// ```
/// use loopwatch::similarity::ratio;
///
/// assert_eq!(ratio("Hello", "hello"), 1.0);
/// assert_eq!(ratio("abc", "xyz"), 0.0);
/// ```
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched: usize = matching_blocks(&a, &b).iter().map(|m| m.len).sum();
    2.0 * matched as f64 / total as f64
}

/// Returns true when the similarity ratio strictly exceeds `threshold`.
#[must_use]
pub fn similar(a: &str, b: &str, threshold: f64) -> bool {
    ratio(a, b) > threshold
}

/// Computes the non-overlapping matching blocks of two character sequences,
/// ordered by position.
#[must_use]
pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<MatchingBlock> {
    let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b_index.entry(*c).or_default().push(j);
    }

    let mut blocks = Vec::new();
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let block = longest_match(a, &b_index, a_lo, a_hi, b_lo, b_hi);
        if block.len == 0 {
            continue;
        }

        if a_lo < block.a_start && b_lo < block.b_start {
            pending.push((a_lo, block.a_start, b_lo, block.b_start));
        }
        let a_end = block.a_start + block.len;
        let b_end = block.b_start + block.len;
        if a_end < a_hi && b_end < b_hi {
            pending.push((a_end, a_hi, b_end, b_hi));
        }
        blocks.push(block);
    }

    blocks.sort_by_key(|m| (m.a_start, m.b_start));
    blocks
}

/// Finds the longest block shared by `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b_index: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> MatchingBlock {
    let mut best = MatchingBlock {
        a_start: a_lo,
        b_start: b_lo,
        len: 0,
    };

    // Length of the match ending at (i - 1, j), keyed by j.
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut next_run_lengths = HashMap::new();
        if let Some(positions) = b_index.get(c) {
            for &j in positions {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run_lengths.insert(j, k);
                if k > best.len {
                    best = MatchingBlock {
                        a_start: i + 1 - k,
                        b_start: j + 1 - k,
                        len: k,
                    };
                }
            }
        }
        run_lengths = next_run_lengths;
    }

    best
}
