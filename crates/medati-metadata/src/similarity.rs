//! Ratcliff/Obershelp string similarity.
//!
//! [`ratio`] computes `2 * M / T`, where `T` is the combined length of both strings and
//! `M` the number of characters covered by their matching blocks. Blocks are found by
//! taking the longest common run, then recursing into the unmatched text on its left
//! and right. The block search matches `difflib.SequenceMatcher` (without a junk
//! predicate), so scores line up with metadata tooling written against it.

use std::collections::HashMap;

use thiserror::Error;

/// Minimum score a column needs to be accepted as the match for a metadata field.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Targets at least this long ignore "popular" characters when seeding block searches.
const POPULAR_MIN_LEN: usize = 200;

/// A run of `size` equal characters starting at `a` in the first string and `b` in the
/// second. Offsets count `char`s, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchingBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    /// Positions of each character of `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, ch) in b.iter().enumerate() {
            b2j.entry(*ch).or_default().push(j);
        }

        // Characters making up more than 1% of a long `b` do not seed matches; runs
        // through them are still picked up when a block is extended.
        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block in `a[alo..ahi]` / `b[blo..bhi]`; earliest in `a`, then in `b`, on ties.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i - 1], b[j].
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
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = next;
        }

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
            a: besti,
            b: bestj,
            size: bestsize,
        }
    }

    fn matching_blocks(&self) -> Vec<MatchingBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            if alo < block.a && blo < block.b {
                queue.push((alo, block.a, blo, block.b));
            }
            if block.a + block.size < ahi && block.b + block.size < bhi {
                queue.push((block.a + block.size, ahi, block.b + block.size, bhi));
            }
            blocks.push(block);
        }
        blocks.sort_unstable();

        let mut collapsed: Vec<MatchingBlock> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(last) = collapsed.last_mut() {
                if last.a + last.size == block.a && last.b + last.size == block.b {
                    last.size += block.size;
                    continue;
                }
            }
            collapsed.push(block);
        }
        collapsed
    }
}

/// Matching blocks of `a` and `b`, sorted by position. Adjacent blocks are merged.
pub fn matching_blocks(a: &str, b: &str) -> Vec<MatchingBlock> {
    SequenceMatcher::new(a, b).matching_blocks()
}

/// Similarity of `a` and `b` in `[0, 1]`.
///
/// Identical strings (including two empty strings) score exactly `1.0`; strings without a
/// single common character score `0.0`. The score is not symmetric in general.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let matcher = SequenceMatcher::new(a, b);
    let matched: usize = matcher.matching_blocks().iter().map(|m| m.size).sum();
    let total = matcher.a.len() + matcher.b.len();
    2.0 * matched as f64 / total as f64
}

/// No candidate reached [`SIMILARITY_THRESHOLD`] for `target`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "metadata field name `{target}` has no similar column among {candidates:?}; \
     every similarity is below {}: {}",
    SIMILARITY_THRESHOLD,
    format_scores(.scores)
)]
pub struct NoSimilarMatch {
    pub target: String,
    pub candidates: Vec<String>,
    /// Score of every candidate against `target`, in candidate order.
    pub scores: Vec<(String, f64)>,
}

fn format_scores(scores: &[(String, f64)]) -> String {
    let parts: Vec<String> = scores
        .iter()
        .map(|(candidate, score)| format!("{candidate}={score:.3}"))
        .collect();
    format!("[{}]", parts.join(", "))
}

/// Pick the candidate most similar to `target`.
///
/// Candidates are scored in order and the scan stops at the first perfect score. The
/// first candidate holding the maximum wins, so ties go to the earlier candidate. The
/// comparison is case-sensitive; callers lowercase `target` when needed.
pub fn best_match<S: AsRef<str>>(candidates: &[S], target: &str) -> Result<String, NoSimilarMatch> {
    let mut scores: Vec<(String, f64)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let score = ratio(candidate, target);
        scores.push((candidate.to_string(), score));
        if score == 1.0 {
            break;
        }
    }

    let best = scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, (_, score))| match best {
            Some((_, current)) if current >= *score => best,
            _ => Some((idx, *score)),
        });

    match best {
        Some((idx, score)) if score >= SIMILARITY_THRESHOLD => Ok(scores.swap_remove(idx).0),
        _ => Err(NoSimilarMatch {
            target: target.to_string(),
            candidates: candidates.iter().map(|c| c.as_ref().to_string()).collect(),
            scores,
        }),
    }
}
